//! Per-author engagement leaderboard.
use std::collections::HashMap;

use pulse_social::Tweet;
use serde::{Deserialize, Serialize};

/// Summed engagement for one author (or for everyone, see [`Leaderboard::totals`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounters {
    pub posts: u64,
    pub likes: u64,
    pub retweets: u64,
    pub comments: u64,
    pub quotes: u64,
    pub views: u64,
}

impl EngagementCounters {
    pub fn record(&mut self, tweet: &Tweet) {
        self.posts = self.posts.saturating_add(1);
        self.likes = self.likes.saturating_add(tweet.likes());
        self.retweets = self.retweets.saturating_add(tweet.retweets());
        self.comments = self.comments.saturating_add(tweet.replies());
        self.quotes = self.quotes.saturating_add(tweet.quotes());
        self.views = self.views.saturating_add(tweet.views());
    }

    pub fn absorb(&mut self, other: &EngagementCounters) {
        self.posts = self.posts.saturating_add(other.posts);
        self.likes = self.likes.saturating_add(other.likes);
        self.retweets = self.retweets.saturating_add(other.retweets);
        self.comments = self.comments.saturating_add(other.comments);
        self.quotes = self.quotes.saturating_add(other.quotes);
        self.views = self.views.saturating_add(other.views);
    }
}

/// Authors in first-seen order. Serialized as `[[name, counters], ...]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaderboard {
    entries: Vec<(String, EngagementCounters)>,
    skipped: usize,
}

impl Leaderboard {
    pub fn entries(&self) -> &[(String, EngagementCounters)] {
        &self.entries
    }

    pub fn get(&self, author: &str) -> Option<&EngagementCounters> {
        self.entries
            .iter()
            .find(|(name, _)| name == author)
            .map(|(_, c)| c)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tweets left out because they carried no author screen name.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn totals(&self) -> EngagementCounters {
        self.entries
            .iter()
            .fold(EngagementCounters::default(), |mut acc, (_, c)| {
                acc.absorb(c);
                acc
            })
    }
}

pub fn build_leaderboard(tweets: &[Tweet]) -> Leaderboard {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut board = Leaderboard::default();

    for tweet in tweets {
        let Some(name) = tweet.screen_name() else {
            tracing::debug!(tweet_id = ?tweet.key(), "leaderboard.missing_author");
            board.skipped += 1;
            continue;
        };
        let slot = *index.entry(name.to_string()).or_insert_with(|| {
            board
                .entries
                .push((name.to_string(), EngagementCounters::default()));
            board.entries.len() - 1
        });
        board.entries[slot].1.record(tweet);
    }

    tracing::info!(
        authors = board.entries.len(),
        skipped = board.skipped,
        "leaderboard.built"
    );
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tweets(v: serde_json::Value) -> Vec<Tweet> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn sums_metrics_per_author() {
        let board = build_leaderboard(&tweets(json!([
            { "id": "1", "created_at": "2024-01-01T00:00:00Z", "user": { "screen_name": "a" }, "favorite_count": 5 },
            { "id": "2", "created_at": "2024-01-01T00:00:00Z", "user": { "screen_name": "a" }, "favorite_count": 3 }
        ])));

        assert_eq!(board.len(), 1);
        assert_eq!(
            board.get("a"),
            Some(&EngagementCounters {
                posts: 2,
                likes: 8,
                ..Default::default()
            })
        );
    }

    #[test]
    fn keeps_first_seen_order_and_maps_every_metric() {
        let board = build_leaderboard(&tweets(json!([
            { "id": "1", "user": { "screen_name": "zed" }, "favorite_count": 1, "retweet_count": 2,
              "reply_count": 3, "quote_count": 4, "views_count": 5 },
            { "id": "2", "user": { "screen_name": "amy" }, "favorite_count": 100 },
            { "id": "3", "user": { "screen_name": "zed" }, "views_count": 10 }
        ])));

        let names: Vec<&str> = board.entries().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["zed", "amy"]);
        assert_eq!(
            board.get("zed"),
            Some(&EngagementCounters {
                posts: 2,
                likes: 1,
                retweets: 2,
                comments: 3,
                quotes: 4,
                views: 15,
            })
        );
    }

    #[test]
    fn tweets_without_author_are_skipped() {
        let board = build_leaderboard(&tweets(json!([
            { "id": "1" },
            { "id": "2", "user": {} },
            { "id": "3", "user": { "screen_name": "" } },
            { "id": "4", "user": { "screen_name": "b" } }
        ])));
        assert_eq!(board.len(), 1);
        assert_eq!(board.skipped(), 3);
    }

    #[test]
    fn totals_add_up_across_authors() {
        let board = build_leaderboard(&tweets(json!([
            { "id": "1", "user": { "screen_name": "a" }, "favorite_count": 2, "views_count": 7 },
            { "id": "2", "user": { "screen_name": "b" }, "favorite_count": 3 }
        ])));
        let totals = board.totals();
        assert_eq!(totals.posts, 2);
        assert_eq!(totals.likes, 5);
        assert_eq!(totals.views, 7);
    }

    #[test]
    fn counters_saturate() {
        let mut c = EngagementCounters {
            likes: u64::MAX,
            ..Default::default()
        };
        let t: Tweet = serde_json::from_value(json!({ "favorite_count": 1 })).unwrap();
        c.record(&t);
        assert_eq!(c.likes, u64::MAX);
    }
}
