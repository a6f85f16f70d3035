//! socialdata.tools integration surface.
//!
//! `client` wraps the shared HTTP client with auth and request shaping; `types`
//! holds the page and tweet models, including `created_at` parsing.
pub mod client;
pub mod types;

pub use client::CommunityApi;
pub use types::{Author, Tweet, TweetId, TweetPage};
