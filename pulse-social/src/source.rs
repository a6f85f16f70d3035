use crate::socialdata::TweetPage;
use anyhow::Result;
use async_trait::async_trait;

/// Anything that can hand out tweet pages by cursor.
///
/// `None` asks for the first page. Implementations must not retry; an error
/// ends the collection run.
#[async_trait]
pub trait TweetSource: Send + Sync {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<TweetPage>;
}
