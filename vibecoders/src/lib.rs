#![warn(rust_2018_idioms)]
#![warn(missing_docs)]

//! # vibecoders client for Rust
//!
//! An asynchronous JSON client for the vibecoders community site: a small
//! voting forum, a personal budget tracker, and the account plumbing around
//! them (sessions, magic links, admin user management).
//!
//! The crate is split into a thin typed transport ([`Client`]) and the
//! stateful sessions that sit on top of it:
//!
//! * [`feed::FeedSession`]: the paginated, sortable, votable forum feed
//! * [`budget::BudgetSession`]: transactions, categories and bulk import
//! * [`auth::AuthSession`]: who is signed in
//!
//! Sessions own their state and borrow the client per call, so there is one
//! place that mutates the feed and one cookie store behind every request.
//!
//! Check out the terminal client that lives alongside this crate for sample
//! usage.

pub mod auth;
pub mod budget;
pub mod client;
pub mod cooldown;
pub mod error;
pub mod feed;
pub mod models;

pub use client::Client;
pub use error::Error;
pub use url;

/// Default URL of a locally running site. Useful as `base_url` to [`Client`]
pub const URL: &str = "http://localhost:8080/";
