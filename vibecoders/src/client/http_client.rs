use std::fs::File;
use std::sync::{Arc, Mutex};

use cookie_store::CookieStore;
use log::debug;
use reqwest::header::{HeaderMap, ACCEPT, COOKIE, SET_COOKIE};
use reqwest::{Client as ReqwestClient, Response};
use serde::Serialize;
use url::Url;

use crate::error::Error;

/// Cookie-aware HTTP plumbing shared by all API calls
///
/// Redirects are disabled on the inner client, so the session cookie handed
/// out by the backend is captured here rather than lost to a redirect hop.
#[derive(Clone)]
pub(super) struct HttpClient {
    base_url: Url,
    reqwest: ReqwestClient,
    cookies: Arc<Mutex<CookieStore>>,
}

impl HttpClient {
    pub(super) fn new(
        base_url: Url,
        reqwest: ReqwestClient,
        cookies: Arc<Mutex<CookieStore>>,
    ) -> Self {
        HttpClient {
            base_url,
            reqwest,
            cookies,
        }
    }

    pub(super) async fn get(&self, path: &str) -> Result<Response, Error> {
        let url = self.base_url.join(path)?;
        debug!("GET {}", url.as_str());

        let res = self
            .reqwest
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .headers(self.cookie_headers(&url))
            .send()
            .await?;

        Ok(self.store_cookies(res))
    }

    pub(super) async fn post<B>(&self, path: &str, body: &B) -> Result<Response, Error>
    where
        B: Serialize,
    {
        self.send_json(reqwest::Method::POST, path, body).await
    }

    pub(super) async fn put<B>(&self, path: &str, body: &B) -> Result<Response, Error>
    where
        B: Serialize,
    {
        self.send_json(reqwest::Method::PUT, path, body).await
    }

    pub(super) async fn patch<B>(&self, path: &str, body: &B) -> Result<Response, Error>
    where
        B: Serialize,
    {
        self.send_json(reqwest::Method::PATCH, path, body).await
    }

    pub(super) async fn delete(&self, path: &str) -> Result<Response, Error> {
        let url = self.base_url.join(path)?;
        debug!("DELETE {}", url.as_str());

        let res = self
            .reqwest
            .delete(url.clone())
            .header(ACCEPT, "application/json")
            .headers(self.cookie_headers(&url))
            .send()
            .await?;

        Ok(self.store_cookies(res))
    }

    async fn send_json<B>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<Response, Error>
    where
        B: Serialize,
    {
        let url = self.base_url.join(path)?;
        debug!("{} {}", method, url.as_str());

        let res = self
            .reqwest
            .request(method, url.clone())
            .header(ACCEPT, "application/json")
            .headers(self.cookie_headers(&url))
            .json(body)
            .send()
            .await?;

        Ok(self.store_cookies(res))
    }

    pub(super) fn save_cookies(&self, file: &mut File) -> Result<(), Error> {
        self.cookies
            .lock()
            .unwrap()
            .save_json(file)
            .map_err(|_err| Error::CookieStore)
    }

    pub(super) fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn cookie_headers(&self, url: &Url) -> HeaderMap {
        let store = self.cookies.lock().unwrap();
        let mut headers = HeaderMap::new();

        let header = store
            .matches(url)
            .iter()
            .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
            .collect::<Vec<_>>()
            .join("; ");

        if !header.is_empty() {
            // A cookie value that fails header encoding is dropped rather
            // than failing the whole request
            if let Ok(value) = header.parse() {
                headers.insert(COOKIE, value);
            }
        }

        headers
    }

    fn store_cookies(&self, res: Response) -> Response {
        let mut store = self.cookies.lock().unwrap();
        res.headers().get_all(SET_COOKIE).iter().for_each(|cookie| {
            let _ = cookie
                .to_str()
                .ok()
                .and_then(|cookie| store.parse(cookie, res.url()).ok());
        });

        res
    }
}
