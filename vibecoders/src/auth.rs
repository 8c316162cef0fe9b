//! Viewer identity
//!
//! [`AuthSession`] is the explicit stand-in for the site's ambient auth
//! provider: it is constructed once at startup, passed by reference to the
//! components that need to know who is signed in, and holds nothing but the
//! viewer. The session cookie itself lives in the [`Client`]'s cookie store.

use log::debug;

use crate::client::Client;
use crate::error::Error;
use crate::models::{Registration, User};

/// The currently signed-in viewer, if any
#[derive(Debug, Default)]
pub struct AuthSession {
    user: Option<User>,
}

impl AuthSession {
    /// A session with nobody signed in
    pub fn signed_out() -> Self {
        AuthSession { user: None }
    }

    /// Resume whatever session the cookie store carries
    ///
    /// A missing or expired session cookie is not an error; it simply means
    /// nobody is signed in.
    pub async fn resume(client: &Client) -> Result<Self, Error> {
        let user = client.current_user().await?;
        match &user {
            Some(user) => debug!("resumed session for {}", user.username),
            None => debug!("no session to resume"),
        }
        Ok(AuthSession { user })
    }

    /// The signed-in viewer
    pub fn viewer(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Sign in with username and password
    ///
    /// On success the full user record is fetched and becomes the viewer.
    pub async fn login(
        &mut self,
        client: &Client,
        username: &str,
        password: &str,
    ) -> Result<&User, Error> {
        client.login(username, password).await?;

        let user = client.current_user().await?.ok_or(Error::Backend {
            status: 500,
            message: "login succeeded but no session was established".to_string(),
        })?;
        self.user = Some(user);
        // NOTE(unwrap): assigned on the previous line
        Ok(self.user.as_ref().unwrap())
    }

    /// Sign in by redeeming a magic link token
    pub async fn login_with_magic_link(
        &mut self,
        client: &Client,
        token: &str,
    ) -> Result<&User, Error> {
        client.redeem_magic_link(token).await?;

        let user = client.current_user().await?.ok_or(Error::Backend {
            status: 500,
            message: "magic link accepted but no session was established".to_string(),
        })?;
        self.user = Some(user);
        // NOTE(unwrap): assigned on the previous line
        Ok(self.user.as_ref().unwrap())
    }

    /// Sign out, clearing the viewer whatever the server says
    pub async fn logout(&mut self, client: &Client) -> Result<(), Error> {
        let result = client.logout().await;
        self.user = None;
        result
    }

    /// Register a new account
    ///
    /// The password/confirmation mismatch is caught client-side before any
    /// request is made.
    pub async fn register(client: &Client, registration: &Registration) -> Result<(), Error> {
        if registration.password != registration.confirm_password {
            return Err(Error::Validation("Passwords do not match".to_string()));
        }
        if registration.username.trim().is_empty() {
            return Err(Error::Validation("Username is required".to_string()));
        }

        client.register(registration).await
    }

    #[cfg(test)]
    pub(crate) fn test_viewer(username: &str) -> Self {
        use chrono::{TimeZone, Utc};

        AuthSession {
            user: Some(User {
                id: 1,
                username: username.to_string(),
                fullname: String::new(),
                bio: String::new(),
                linked_in_url: String::new(),
                github_url: String::new(),
                photo_url: String::new(),
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                is_admin: false,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Registration;
    use url::Url;

    #[tokio::test]
    async fn register_rejects_password_mismatch_before_any_request() {
        let client = Client::new(Url::parse("http://127.0.0.1:9/").unwrap()).unwrap();
        let registration = Registration {
            username: "mara".to_string(),
            password: "one".to_string(),
            confirm_password: "two".to_string(),
            ..Registration::default()
        };

        let result = AuthSession::register(&client, &registration).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn signed_out_session_has_no_viewer() {
        assert!(AuthSession::signed_out().viewer().is_none());
    }
}
