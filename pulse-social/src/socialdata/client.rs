//! Thin wrapper around the socialdata.tools community tweets endpoint.
//!
//! Handles bearer auth and request parameter shaping (`type=Latest`, `limit`,
//! optional `cursor`) before delegating to the shared HTTP client. Every call
//! is a single attempt.
use crate::socialdata::types::TweetPage;
use crate::source::TweetSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use pulse_http::{Auth, HttpClient, RequestOpts};
use std::borrow::Cow;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.socialdata.tools";
pub const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct CommunityApi {
    http: HttpClient,
    bearer: String,
    community_id: String,
    page_size: u32,
}

impl CommunityApi {
    pub fn new(base_url: &str, bearer_token: String, community_id: String) -> Result<Self> {
        let http = HttpClient::new(base_url)
            .with_context(|| format!("invalid socialdata base url: {base_url}"))?;
        Ok(Self {
            http,
            bearer: bearer_token,
            community_id,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, n: u32) -> Self {
        self.page_size = n.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.http = self.http.with_timeout(dur);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub async fn community_tweets(&self, cursor: Option<&str>) -> Result<TweetPage> {
        let mut params: Vec<(&str, Cow<'_, str>)> = vec![
            ("type", "Latest".into()),
            ("limit", self.page_size.to_string().into()),
        ];
        if let Some(c) = cursor.filter(|c| !c.is_empty()) {
            params.push(("cursor", c.into()));
        }

        let path = format!("twitter/community/{}/tweets", self.community_id);
        let page: TweetPage = self
            .http
            .get_json(
                &path,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.bearer)),
                    query: Some(params),
                    ..Default::default()
                },
            )
            .await
            .with_context(|| {
                format!(
                    "fetching tweets for community {} (cursor={})",
                    self.community_id,
                    cursor.unwrap_or("-")
                )
            })?;

        tracing::debug!(
            community_id = %self.community_id,
            tweets = page.tweets.as_ref().map_or(0, Vec::len),
            next_cursor = ?page.cursor(),
            "socialdata.page"
        );
        Ok(page)
    }
}

#[async_trait]
impl TweetSource for CommunityApi {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<TweetPage> {
        self.community_tweets(cursor).await
    }
}
