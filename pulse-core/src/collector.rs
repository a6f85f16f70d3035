//! Paged collection of community tweets.
//!
//! The collector walks the cursor chain of a [`TweetSource`], keeping tweets
//! that are new to this run and inside the trailing window. Filtering policy is
//! dedup + trailing window; there is no dedup-only mode. A tweet whose
//! `created_at` is missing or unparseable skips the window check and is kept
//! if it is new.
//!
//! Stop conditions, checked in this order on every page:
//! 1. the page is empty;
//! 2. nothing on the page survived filtering (a run of all-duplicate pages can
//!    be tolerated via [`CollectorSettings::stale_page_tolerance`]);
//! 3. the API returned no next cursor;
//! 4. the next cursor repeats the one just used;
//! 5. the page budget ([`CollectorSettings::max_pages`]) is spent.
use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use pulse_config::PulseConfig;
use pulse_social::{Tweet, TweetSource};

#[derive(Debug, Clone)]
pub struct CollectorSettings {
    /// Trailing acceptance window ending at the run's start time.
    pub window: TimeDelta,
    pub page_delay: Duration,
    pub stale_page_tolerance: u32,
    pub max_pages: Option<u32>,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            window: TimeDelta::days(60),
            page_delay: Duration::from_secs(3),
            stale_page_tolerance: 0,
            max_pages: None,
        }
    }
}

impl From<&PulseConfig> for CollectorSettings {
    fn from(cfg: &PulseConfig) -> Self {
        Self {
            window: TimeDelta::days(i64::from(cfg.window_days)),
            page_delay: cfg.page_delay(),
            stale_page_tolerance: cfg.stale_page_tolerance,
            max_pages: cfg.max_pages,
        }
    }
}

/// Why the pagination loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The API returned an empty page.
    Exhausted,
    /// A page had nothing new inside the window.
    NoRelevantTweets,
    /// No next cursor.
    LastPage,
    /// The API handed back the cursor we just used.
    RepeatedCursor,
    /// `max_pages` reached.
    PageLimit,
}

#[derive(Debug, Clone)]
pub struct Collection {
    pub tweets: Vec<Tweet>,
    pub pages: u32,
    pub stop: StopReason,
}

#[derive(Debug, Default)]
struct PageOutcome {
    accepted: Vec<Tweet>,
    duplicates: usize,
    out_of_window: usize,
    undated: usize,
    unidentified: usize,
}

pub struct Collector<S> {
    source: S,
    settings: CollectorSettings,
}

impl<S: TweetSource> Collector<S> {
    pub fn new(source: S, settings: CollectorSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// Collect against the current wall clock and return the accepted tweets.
    pub async fn collect(&self) -> Result<Vec<Tweet>> {
        Ok(self.collect_at(Utc::now()).await?.tweets)
    }

    /// Collect with an explicit "now"; the window is `[now - window, ..]`.
    /// A window reaching past the earliest representable instant has no lower
    /// bound.
    pub async fn collect_at(&self, now: DateTime<Utc>) -> Result<Collection> {
        let cutoff = now.checked_sub_signed(self.settings.window);
        let mut tweets: Vec<Tweet> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0u32;
        let mut stale_pages = 0u32;

        tracing::info!(cutoff = ?cutoff, "collector.start");

        let stop = loop {
            let page = self.source.fetch_page(cursor.as_deref()).await?;
            pages += 1;
            let (batch, next) = page.into_parts();

            if batch.is_empty() {
                break StopReason::Exhausted;
            }

            let fetched = batch.len();
            let outcome = filter_page(batch, &mut seen, cutoff);
            tracing::info!(
                page = pages,
                fetched,
                accepted = outcome.accepted.len(),
                duplicates = outcome.duplicates,
                out_of_window = outcome.out_of_window,
                undated = outcome.undated,
                unidentified = outcome.unidentified,
                total = tweets.len() + outcome.accepted.len(),
                "collector.page"
            );

            if outcome.accepted.is_empty() {
                let tolerable = outcome.out_of_window == 0
                    && next.is_some()
                    && stale_pages < self.settings.stale_page_tolerance;
                if !tolerable {
                    break StopReason::NoRelevantTweets;
                }
                stale_pages += 1;
                tracing::debug!(stale_pages, "collector.stale_page_tolerated");
            } else {
                stale_pages = 0;
                tweets.extend(outcome.accepted);
            }

            let Some(next) = next else {
                break StopReason::LastPage;
            };
            if cursor.as_deref() == Some(next.as_str()) {
                tracing::warn!(cursor = %next, "collector.repeated_cursor");
                break StopReason::RepeatedCursor;
            }
            if self.settings.max_pages.is_some_and(|max| pages >= max) {
                break StopReason::PageLimit;
            }
            cursor = Some(next);

            if !self.settings.page_delay.is_zero() {
                tokio::time::sleep(self.settings.page_delay).await;
            }
        };

        tracing::info!(pages, total = tweets.len(), stop = ?stop, "collector.done");
        Ok(Collection {
            tweets,
            pages,
            stop,
        })
    }
}

fn filter_page(
    batch: Vec<Tweet>,
    seen: &mut HashSet<String>,
    cutoff: Option<DateTime<Utc>>,
) -> PageOutcome {
    let mut outcome = PageOutcome::default();
    for tweet in batch {
        let Some(key) = tweet.key() else {
            tracing::warn!("collector.tweet_without_id");
            outcome.unidentified += 1;
            continue;
        };
        if seen.contains(&key) {
            outcome.duplicates += 1;
            continue;
        }
        match tweet.created_at_utc() {
            Some(created) if cutoff.is_some_and(|cutoff| created < cutoff) => {
                outcome.out_of_window += 1;
                continue;
            }
            Some(_) => {}
            None => {
                tracing::warn!(
                    tweet_id = %key,
                    created_at = ?tweet.created_at(),
                    "collector.unparseable_created_at"
                );
                outcome.undated += 1;
            }
        }
        seen.insert(key);
        outcome.accepted.push(tweet);
    }
    outcome
}
