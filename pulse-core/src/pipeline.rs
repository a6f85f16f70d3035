//! One collection run: fetch, write the raw snapshot, then regenerate the
//! leaderboard and daily snapshots from it.
use std::time::Instant;

use anyhow::{Context, Result};
use pulse_config::{OutputPaths, PulseConfig};
use pulse_social::{CommunityApi, Tweet, TweetSource};

use crate::collector::{Collector, CollectorSettings, StopReason};
use crate::daily::{DailyStats, build_daily_stats};
use crate::leaderboard::{EngagementCounters, Leaderboard, build_leaderboard};
use crate::snapshot::{load_json, save_json};

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub tweets: usize,
    pub pages: u32,
    pub stop: StopReason,
    pub authors: usize,
    pub days: usize,
    pub totals: EngagementCounters,
}

/// Build the community client from config and run once.
pub async fn run(config: &PulseConfig) -> Result<RunSummary> {
    let mut api = CommunityApi::new(
        &config.base_url,
        config.api_key.clone(),
        config.community_id.clone(),
    )?
    .with_page_size(config.page_size);
    if let Some(timeout) = config.request_timeout() {
        api = api.with_timeout(timeout);
    }

    let collector = Collector::new(api, CollectorSettings::from(config));
    run_with(&collector, &config.output).await
}

pub async fn run_with<S: TweetSource>(
    collector: &Collector<S>,
    output: &OutputPaths,
) -> Result<RunSummary> {
    let started = Instant::now();
    let collection = collector
        .collect_at(chrono::Utc::now())
        .await
        .context("tweet collection failed")?;

    save_json(&output.tweets, &collection.tweets).context("writing raw tweet snapshot")?;
    let (leaderboard, daily) = write_aggregates(&collection.tweets, output)?;

    let summary = RunSummary {
        tweets: collection.tweets.len(),
        pages: collection.pages,
        stop: collection.stop,
        authors: leaderboard.len(),
        days: daily.len(),
        totals: leaderboard.totals(),
    };
    tracing::info!(
        tweets = summary.tweets,
        pages = summary.pages,
        stop = ?summary.stop,
        authors = summary.authors,
        days = summary.days,
        posts = summary.totals.posts,
        likes = summary.totals.likes,
        retweets = summary.totals.retweets,
        comments = summary.totals.comments,
        quotes = summary.totals.quotes,
        views = summary.totals.views,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "pipeline.done"
    );
    Ok(summary)
}

/// Regenerate both aggregate snapshots from an in-memory tweet set.
pub fn write_aggregates(
    tweets: &[Tweet],
    output: &OutputPaths,
) -> Result<(Leaderboard, DailyStats)> {
    let leaderboard = build_leaderboard(tweets);
    save_json(&output.leaderboard, leaderboard.entries()).context("writing leaderboard")?;

    let daily = build_daily_stats(tweets);
    save_json(&output.daily, daily.entries()).context("writing daily stats")?;

    Ok((leaderboard, daily))
}

/// Regenerate the aggregates from the raw snapshot already on disk.
pub fn rebuild_from_snapshot(output: &OutputPaths) -> Result<(Leaderboard, DailyStats)> {
    let tweets: Vec<Tweet> = load_json(&output.tweets).context("reading raw tweet snapshot")?;
    write_aggregates(&tweets, output)
}
