//! Posts per UTC calendar day.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use pulse_social::Tweet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub posts: u64,
}

/// Days in ascending order, one entry per date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyStats {
    entries: Vec<DailyEntry>,
    skipped: usize,
}

impl DailyStats {
    pub fn entries(&self) -> &[DailyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tweets left out because `created_at` was missing or unparseable.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn total_posts(&self) -> u64 {
        self.entries.iter().map(|e| e.posts).sum()
    }
}

pub fn build_daily_stats(tweets: &[Tweet]) -> DailyStats {
    let mut buckets: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    let mut skipped = 0usize;

    for tweet in tweets {
        match tweet.created_at_utc() {
            Some(ts) => *buckets.entry(ts.date_naive()).or_default() += 1,
            None => {
                tracing::warn!(
                    tweet_id = ?tweet.key(),
                    created_at = ?tweet.created_at(),
                    "daily.unparseable_created_at"
                );
                skipped += 1;
            }
        }
    }

    let entries: Vec<DailyEntry> = buckets
        .into_iter()
        .map(|(date, posts)| DailyEntry { date, posts })
        .collect();
    tracing::info!(days = entries.len(), skipped, "daily.built");
    DailyStats { entries, skipped }
}
