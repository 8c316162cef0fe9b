//! Typed client for the backend REST surface

use std::fs::{self, DirBuilder, File};
use std::io;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use cookie_store::CookieStore;
use directories::ProjectDirs;
use reqwest::{ClientBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::error::Error;
use crate::models::{
    AdminUserUpdate, BulkImportReceipt, BulkTransaction, Category, MagicLink, NewComment, NewPost,
    Post, ProfileUpdate, Registration, SortMode, Transaction, User, UserPage,
};

mod http_client;

use http_client::HttpClient;

/// Asynchronous client for the site's JSON API
///
/// Holds the session cookie between calls; [`Client::save_cookies`] persists
/// it so later invocations start signed in.
#[derive(Clone)]
pub struct Client {
    http: HttpClient,
}

/// Shape of every backend error body
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

fn config_path() -> Result<PathBuf, Error> {
    ProjectDirs::from("rs", "vibecoders", env!("CARGO_PKG_NAME"))
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
        .ok_or(Error::HomeNotFound)
}

fn cookie_store_path() -> Result<PathBuf, Error> {
    let mut cookie_store_path = config_path()?;
    cookie_store_path.push("cookies.json");
    Ok(cookie_store_path)
}

impl Client {
    /// Create a new client
    ///
    /// Will attempt to load the cookie store if it exists.
    pub fn new(base_url: Url) -> Result<Self, Error> {
        let cookie_store_path = cookie_store_path()?;

        let cookies = if cookie_store_path.exists() {
            let cookie_file = BufReader::new(File::open(cookie_store_path)?);
            CookieStore::load_json(cookie_file).map_err(|_err| Error::CookieStore)?
        } else {
            CookieStore::default()
        };

        let client = ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .use_rustls_tls()
            .build()?;
        let http = HttpClient::new(base_url, client, Arc::new(Mutex::new(cookies)));

        Ok(Client { http })
    }

    /// Save the cookie store so that a client can be created without needing to log in first
    pub fn save_cookies(&self) -> Result<(), Error> {
        let cookie_store_path = cookie_store_path()?;
        let cookie_store_tmp_path = cookie_store_path.with_extension("tmp");

        // Ensure the directory the cookie file is stored in exists
        let config_dir = cookie_store_path.parent().ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::Other,
                "unable to find parent dir of cookie file",
            ))
        })?;

        if !config_dir.exists() {
            DirBuilder::new().recursive(true).create(config_dir)?;
        }

        {
            // Write out the file entirely
            let mut tmp_file = File::create(&cookie_store_tmp_path)?;
            self.http.save_cookies(&mut tmp_file)?;
        }

        // Move into place atomically
        fs::rename(cookie_store_tmp_path, cookie_store_path).map_err(Error::from)
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &Url {
        self.http.base_url()
    }

    // --- Forum ---

    /// Retrieve one page of the forum feed
    pub async fn posts(&self, sort: SortMode, page: u32, limit: u32) -> Result<Vec<Post>, Error> {
        let path = format!("api/forum?sort={}&page={}&limit={}", sort, page, limit);
        decode(self.http.get(&path).await?).await
    }

    /// Retrieve a single post with its comments
    pub async fn post(&self, post_id: i64) -> Result<Post, Error> {
        decode(self.http.get(&format!("api/forum/{}", post_id)).await?).await
    }

    /// Submit a new post, returning the server's copy
    pub async fn create_post(&self, new_post: &NewPost) -> Result<Post, Error> {
        decode(self.http.post("api/forum", new_post).await?).await
    }

    /// Comment on a post, returning the updated post detail
    pub async fn add_comment(&self, post_id: i64, comment: &NewComment) -> Result<Post, Error> {
        let path = format!("api/forum/{}/comments", post_id);
        decode(self.http.post(&path, comment).await?).await
    }

    /// Toggle the viewer's vote on a post, returning the updated post
    pub async fn vote(&self, post_id: i64) -> Result<Post, Error> {
        let path = format!("api/forum/{}/vote", post_id);
        decode(self.http.post(&path, &serde_json::json!({})).await?).await
    }

    // --- Budget ---

    /// All transactions of the viewer, newest day first
    pub async fn transactions(&self) -> Result<Vec<Transaction>, Error> {
        decode(self.http.get("api/budget/transactions").await?).await
    }

    /// All categories of the viewer
    pub async fn categories(&self) -> Result<Vec<Category>, Error> {
        decode(self.http.get("api/budget/categories").await?).await
    }

    /// Create a category, returning the server's copy
    pub async fn create_category(&self, name: &str) -> Result<Category, Error> {
        let body = serde_json::json!({ "name": name });
        decode(self.http.post("api/budget/categories", &body).await?).await
    }

    /// Reassign (or clear, with `None`) the category of a transaction
    pub async fn assign_category(
        &self,
        transaction_id: i64,
        category_id: Option<i64>,
    ) -> Result<(), Error> {
        let body = serde_json::json!({
            "transaction_id": transaction_id,
            "category_id": category_id,
        });
        let res = self
            .http
            .put("api/budget/transactions/category", &body)
            .await?;
        expect_success(res).await
    }

    /// Import parsed transactions in one request
    pub async fn bulk_import(
        &self,
        transactions: &[BulkTransaction],
    ) -> Result<BulkImportReceipt, Error> {
        let body = serde_json::json!({ "transactions": transactions });
        decode(self.http.post("api/budget/transactions/bulk", &body).await?).await
    }

    // --- Session ---

    /// Attempt to authenticate with the server
    ///
    /// The session cookie is captured by the cookie store on success.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), Error> {
        let body = serde_json::json!({ "username": username, "password": password });
        expect_success(self.http.post("api/login", &body).await?).await
    }

    /// End the server-side session
    pub async fn logout(&self) -> Result<(), Error> {
        expect_success(self.http.delete("api/logout").await?).await
    }

    /// Register a new account
    pub async fn register(&self, registration: &Registration) -> Result<(), Error> {
        expect_success(self.http.post("api/register", registration).await?).await
    }

    /// The currently signed-in user, or `None` when the session is absent or expired
    pub async fn current_user(&self) -> Result<Option<User>, Error> {
        let res = self.http.get("api/user").await?;
        if res.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        decode(res).await.map(Some)
    }

    /// Update the viewer's own profile
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), Error> {
        expect_success(self.http.patch("api/user", update).await?).await
    }

    /// Public profile of any user
    pub async fn user(&self, username: &str) -> Result<User, Error> {
        decode(self.http.get(&format!("api/users/{}", username)).await?).await
    }

    // --- Magic links ---

    /// All magic links owned by the viewer
    pub async fn magic_links(&self) -> Result<Vec<MagicLink>, Error> {
        decode(self.http.get("api/magic-links").await?).await
    }

    /// Mint a magic link, optionally redirecting somewhere other than `/`
    pub async fn create_magic_link(&self, redirect_url: Option<&str>) -> Result<MagicLink, Error> {
        let body = serde_json::json!({ "redirect_url": redirect_url.unwrap_or("/") });
        decode(self.http.post("api/magic-links", &body).await?).await
    }

    /// Delete a magic link the viewer owns
    pub async fn delete_magic_link(&self, link_id: i64) -> Result<(), Error> {
        let res = self
            .http
            .delete(&format!("api/magic-links/{}", link_id))
            .await?;
        expect_success(res).await
    }

    /// Redeem a magic link token, signing the bearer in
    pub async fn redeem_magic_link(&self, token: &str) -> Result<(), Error> {
        expect_success(self.http.get(&format!("api/magic/{}", token)).await?).await
    }

    // --- Admin ---

    /// One page of the user listing, admin only
    pub async fn admin_users(&self, page: u32, page_size: u32) -> Result<UserPage, Error> {
        let path = format!("api/admin/users?page={}&pageSize={}", page, page_size);
        decode(self.http.get(&path).await?).await
    }

    /// A single user by id, admin only
    pub async fn admin_user(&self, user_id: i64) -> Result<User, Error> {
        decode(self.http.get(&format!("api/admin/users/{}", user_id)).await?).await
    }

    /// Update any user, admin only
    pub async fn admin_update_user(
        &self,
        user_id: i64,
        update: &AdminUserUpdate,
    ) -> Result<(), Error> {
        let res = self
            .http
            .put(&format!("api/admin/users/{}", user_id), update)
            .await?;
        expect_success(res).await
    }

    /// Delete a user, admin only
    pub async fn admin_delete_user(&self, user_id: i64) -> Result<(), Error> {
        let res = self.http.delete(&format!("api/admin/users/{}", user_id)).await?;
        expect_success(res).await
    }
}

/// Decode a JSON body, mapping non-success statuses to [`Error::Backend`]
async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, Error> {
    let status = res.status();
    if status.is_success() {
        res.json().await.map_err(Error::from)
    } else {
        Err(backend_error(status, res).await)
    }
}

/// Check the status of a response whose body we don't need
async fn expect_success(res: Response) -> Result<(), Error> {
    let status = res.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(backend_error(status, res).await)
    }
}

/// Pull the `{error: string}` body out of a failed response, falling back to
/// a generic message when no parseable body is present
async fn backend_error(status: StatusCode, res: Response) -> Error {
    let message = res
        .text()
        .await
        .ok()
        .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
        .map(|body| body.error)
        .unwrap_or_else(|| format!("request failed with status {}", status));

    Error::Backend {
        status: status.as_u16(),
        message,
    }
}
