//! Social API clients used by Community Pulse.
//!
//! Only the socialdata.tools community-tweets endpoint is implemented. The
//! [`source::TweetSource`] trait is the seam the collector pages through, so
//! tests can swap in scripted pages.
pub mod socialdata;
pub mod source;

pub use socialdata::{CommunityApi, Tweet, TweetPage};
pub use source::TweetSource;
