//! Forum feed session
//!
//! [`FeedSession`] owns the accumulated post list for one sort mode, the page
//! cursor, the open post detail, and the per-post vote cooldown. It is the
//! only thing that mutates that state; the transport lives in [`Client`] and
//! is passed in by reference per call.

use std::time::Duration;

use log::debug;

use crate::auth::AuthSession;
use crate::client::Client;
use crate::cooldown::CooldownCache;
use crate::error::Error;
use crate::models::{NewComment, NewPost, Post, SortMode};

/// Fixed page size of the feed
pub const PAGE_SIZE: u32 = 20;

/// Minimum spacing between two votes on the same post
pub const VOTE_COOLDOWN: Duration = Duration::from_millis(1000);

/// Where a feed session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// No request outstanding, list is usable
    Idle,
    /// A page load is in flight
    Loading,
    /// The last load failed; the list still holds the prior pages
    Error,
}

/// Result of a vote request
#[derive(Debug)]
pub enum VoteOutcome {
    /// The server applied the vote; this is its authoritative copy of the post
    Updated(Post),
    /// Dropped by the per-post cooldown, no request was made
    Skipped,
}

/// Client-side state machine for the paginated, sortable, votable feed
#[derive(Debug)]
pub struct FeedSession {
    posts: Vec<Post>,
    open_post: Option<Post>,
    sort: SortMode,
    page: u32,
    state: FeedState,
    vote_cooldown: CooldownCache<i64>,
}

impl Default for FeedSession {
    fn default() -> Self {
        FeedSession::new()
    }
}

impl FeedSession {
    /// A fresh session: top sort, page 1, nothing loaded
    pub fn new() -> Self {
        FeedSession {
            posts: Vec::new(),
            open_post: None,
            sort: SortMode::default(),
            page: 1,
            state: FeedState::Idle,
            vote_cooldown: CooldownCache::new(VOTE_COOLDOWN),
        }
    }

    /// The accumulated posts for the current sort mode
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// The currently open post detail, if any
    pub fn open_post(&self) -> Option<&Post> {
        self.open_post.as_ref()
    }

    /// Current sort mode
    pub fn sort(&self) -> SortMode {
        self.sort
    }

    /// Current 1-based page cursor
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Current state
    pub fn state(&self) -> FeedState {
        self.state
    }

    /// Fetch one page of the feed
    ///
    /// With `append` the page is concatenated onto the accumulated list,
    /// otherwise the list is replaced. On failure the list is left exactly
    /// as it was and the session parks in [`FeedState::Error`].
    ///
    /// Overlapping loads are not sequenced: whichever response lands last
    /// wins. Acceptable for interactive use; see the session-level guards in
    /// [`FeedSession::load_next_page`] for the duplicate-request case.
    pub async fn load_feed(
        &mut self,
        client: &Client,
        sort: SortMode,
        page: u32,
        append: bool,
    ) -> Result<(), Error> {
        self.state = FeedState::Loading;

        match client.posts(sort, page, PAGE_SIZE).await {
            Ok(new_posts) => {
                debug!("received {} posts for page {}", new_posts.len(), page);
                if append {
                    self.posts.extend(new_posts);
                } else {
                    self.posts = new_posts;
                }
                self.state = FeedState::Idle;
                Ok(())
            }
            Err(err) => {
                self.state = FeedState::Error;
                Err(err)
            }
        }
    }

    /// Switch sort mode
    ///
    /// Always discards the accumulated pages and resets the cursor to 1
    /// before fetching a fresh first page. Ignored while a load is in
    /// flight.
    pub async fn change_sort(&mut self, client: &Client, sort: SortMode) -> Result<(), Error> {
        if self.state == FeedState::Loading {
            debug!("sort change to {} ignored, load in flight", sort);
            return Ok(());
        }

        self.sort = sort;
        self.page = 1;
        self.posts.clear();
        self.load_feed(client, sort, 1, false).await
    }

    /// Fetch and append the next page
    ///
    /// Returns `Ok(false)` without issuing a request when a load is already
    /// in flight, so a held-down key or double click cannot fan out into
    /// duplicate page fetches.
    pub async fn load_next_page(&mut self, client: &Client) -> Result<bool, Error> {
        if self.state == FeedState::Loading {
            debug!("next page skipped, load in flight");
            return Ok(false);
        }

        self.page += 1;
        self.load_feed(client, self.sort, self.page, true).await?;
        Ok(true)
    }

    /// Open a post, replacing any previously open detail with the server's
    /// response (comments included)
    pub async fn open_post_detail(&mut self, client: &Client, post_id: i64) -> Result<&Post, Error> {
        let post = client.post(post_id).await?;
        self.open_post = Some(post);
        // NOTE(unwrap): assigned on the previous line
        Ok(self.open_post.as_ref().unwrap())
    }

    /// Vote on a post
    ///
    /// Needs a signed-in viewer. A second vote on the same post within
    /// [`VOTE_COOLDOWN`] is silently skipped; votes on different posts never
    /// hold each other up. On success the matching list entry (and the open
    /// detail, if it is the same post) is overwritten with the server's
    /// values; the score is never bumped locally.
    pub async fn vote(
        &mut self,
        client: &Client,
        auth: &AuthSession,
        post_id: i64,
    ) -> Result<VoteOutcome, Error> {
        if auth.viewer().is_none() {
            return Err(Error::AuthRequired);
        }

        if !self.vote_cooldown.try_acquire(post_id) {
            debug!("vote for post {} debounced", post_id);
            return Ok(VoteOutcome::Skipped);
        }

        let updated = client.vote(post_id).await?;
        self.apply_post_update(&updated);
        Ok(VoteOutcome::Updated(updated))
    }

    /// Submit a new post and prepend the server's copy to the list
    ///
    /// Validation happens before any request is made.
    pub async fn create_post(&mut self, client: &Client, new_post: &NewPost) -> Result<&Post, Error> {
        new_post.validate()?;

        let post = client.create_post(new_post).await?;
        self.posts.insert(0, post);
        Ok(&self.posts[0])
    }

    /// Comment on the given post
    ///
    /// The server responds with the whole updated post detail; that response
    /// replaces the open detail outright rather than splicing the comment in
    /// locally.
    pub async fn add_comment(
        &mut self,
        client: &Client,
        post_id: i64,
        content: String,
    ) -> Result<&Post, Error> {
        if content.trim().is_empty() {
            return Err(Error::Validation("Comment content is required".to_string()));
        }

        let post = client.add_comment(post_id, &NewComment { content }).await?;
        self.apply_post_update(&post);
        self.open_post = Some(post);
        // NOTE(unwrap): assigned on the previous line
        Ok(self.open_post.as_ref().unwrap())
    }

    /// Overwrite the matching list entry and open detail with `updated`
    fn apply_post_update(&mut self, updated: &Post) {
        if let Some(post) = self.posts.iter_mut().find(|post| post.id == updated.id) {
            *post = updated.clone();
        }

        if let Some(open) = self.open_post.as_mut() {
            if open.id == updated.id {
                *open = updated.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthSession;
    use chrono::{TimeZone, Utc};
    use url::Url;

    fn test_client() -> Client {
        // Points at the discard port; tests below never let a request reach
        // the network
        Client::new(Url::parse("http://127.0.0.1:9/").unwrap()).unwrap()
    }

    fn post(id: i64, score: i64) -> Post {
        Post {
            id,
            user_id: 1,
            title: format!("post {}", id),
            content: String::new(),
            url: String::new(),
            score,
            created_at: Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap(),
            user: None,
            comments: Vec::new(),
            vote_status: None,
        }
    }

    #[test]
    fn fresh_session_starts_at_page_one_idle() {
        let session = FeedSession::new();
        assert_eq!(session.page(), 1);
        assert_eq!(session.sort(), SortMode::Top);
        assert_eq!(session.state(), FeedState::Idle);
        assert!(session.posts().is_empty());
    }

    #[tokio::test]
    async fn next_page_is_a_noop_while_loading() {
        let client = test_client();
        let mut session = FeedSession::new();
        session.posts = vec![post(1, 5)];
        session.page = 3;
        session.state = FeedState::Loading;

        let loaded = session.load_next_page(&client).await.unwrap();

        assert!(!loaded);
        assert_eq!(session.page(), 3);
        assert_eq!(session.posts().len(), 1);
    }

    #[tokio::test]
    async fn sort_change_is_ignored_while_loading() {
        let client = test_client();
        let mut session = FeedSession::new();
        session.sort = SortMode::Top;
        session.state = FeedState::Loading;

        session.change_sort(&client, SortMode::Newest).await.unwrap();

        assert_eq!(session.sort(), SortMode::Top);
    }

    #[tokio::test]
    async fn sort_change_resets_list_and_page_before_the_request() {
        // The discard port refuses connections, so the fetch fails after the
        // reset: the accumulated pages are gone, the cursor is back at 1, and
        // callers must cope with an empty list rather than a stale one
        let client = test_client();
        let mut session = FeedSession::new();
        session.posts = vec![post(1, 5), post(2, 3)];
        session.page = 3;

        let result = session.change_sort(&client, SortMode::Newest).await;

        assert!(result.is_err());
        assert_eq!(session.sort(), SortMode::Newest);
        assert_eq!(session.page(), 1);
        assert!(session.posts().is_empty());
        assert_eq!(session.state(), FeedState::Error);
    }

    #[tokio::test]
    async fn vote_requires_a_viewer() {
        let client = test_client();
        let mut session = FeedSession::new();
        session.posts = vec![post(5, 6)];

        let result = session.vote(&client, &AuthSession::signed_out(), 5).await;

        assert!(matches!(result, Err(Error::AuthRequired)));
        assert_eq!(session.posts()[0].score, 6);
    }

    #[tokio::test]
    async fn second_vote_on_same_post_is_debounced() {
        let client = test_client();
        let mut session = FeedSession::new();
        session.posts = vec![post(5, 6)];
        let auth = AuthSession::test_viewer("mara");

        // First acquisition consumes the cooldown slot; the vote call that
        // follows must skip without touching the network
        assert!(session.vote_cooldown.try_acquire(5));
        let outcome = session.vote(&client, &auth, 5).await.unwrap();

        assert!(matches!(outcome, VoteOutcome::Skipped));
        assert_eq!(session.posts()[0].score, 6);
    }

    #[test]
    fn cooldown_on_one_post_leaves_others_votable() {
        let mut session = FeedSession::new();
        assert!(session.vote_cooldown.try_acquire(5));
        assert!(session.vote_cooldown.try_acquire(6));
        assert!(!session.vote_cooldown.try_acquire(5));
    }

    #[test]
    fn vote_response_overwrites_local_values() {
        let mut session = FeedSession::new();
        session.posts = vec![post(4, 1), post(5, 3)];
        session.open_post = Some(post(5, 3));

        // Server says the score is 7, whatever we had locally
        let mut updated = post(5, 7);
        updated.vote_status = Some(1);
        session.apply_post_update(&updated);

        assert_eq!(session.posts()[0].score, 1);
        assert_eq!(session.posts()[1].score, 7);
        assert!(session.posts()[1].upvoted());
        assert_eq!(session.open_post().unwrap().score, 7);
    }

    #[test]
    fn update_for_unlisted_post_changes_nothing() {
        let mut session = FeedSession::new();
        session.posts = vec![post(4, 1)];

        session.apply_post_update(&post(99, 50));

        assert_eq!(session.posts().len(), 1);
        assert_eq!(session.posts()[0].id, 4);
    }

    #[tokio::test]
    async fn create_post_validates_before_any_request() {
        let client = test_client();
        let mut session = FeedSession::new();

        let invalid = NewPost {
            title: String::new(),
            content: "body".to_string(),
            url: String::new(),
        };
        let result = session.create_post(&client, &invalid).await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(session.posts().is_empty());
    }

    #[tokio::test]
    async fn empty_comment_is_rejected_before_any_request() {
        let client = test_client();
        let mut session = FeedSession::new();

        let result = session.add_comment(&client, 5, "  ".to_string()).await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
