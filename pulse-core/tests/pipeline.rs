use chrono::{TimeDelta, Utc};
use pulse_config::{PulseConfig, PulseConfigLoader};
use pulse_core::{StopReason, rebuild_from_snapshot, run};
use serde_json::{Value, json};
use serial_test::serial;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMMUNITY: &str = "1951903018464772103";

fn config_for(server: &MockServer, out: &TempDir) -> PulseConfig {
    let yaml = format!(
        r#"
api_key: "test-key"
base_url: "{base}"
community_id: "{COMMUNITY}"
page_delay_ms: 0
output:
  tweets: "{dir}/all_tweets.json"
  leaderboard: "{dir}/leaderboard.json"
  daily: "{dir}/daily_stats.json"
"#,
        base = server.uri(),
        dir = out.path().display(),
    );
    PulseConfigLoader::new()
        .with_env_prefix("PULSE_PIPELINE_TEST")
        .with_yaml_str(&yaml)
        .load()
        .expect("test config")
}

fn days_ago(n: i64) -> String {
    (Utc::now() - TimeDelta::days(n)).to_rfc3339()
}

fn read(path: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
#[serial]
async fn full_run_writes_three_snapshots() {
    let server = MockServer::start().await;
    let endpoint = format!("/twitter/community/{COMMUNITY}/tweets");

    Mock::given(method("GET"))
        .and(path(endpoint.clone()))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tweets": [
                { "id_str": "3", "created_at": days_ago(1), "user": { "screen_name": "анна" },
                  "favorite_count": 5, "views_count": 100 },
                { "id_str": "2", "created_at": days_ago(1), "user": { "screen_name": "bob" },
                  "retweet_count": 2, "reply_count": 1, "views_count": null }
            ],
            "next_cursor": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(endpoint))
        .and(query_param("cursor", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tweets": [
                { "id_str": "2", "created_at": days_ago(1), "user": { "screen_name": "bob" } },
                { "id_str": "1", "created_at": days_ago(3), "user": { "screen_name": "анна" },
                  "favorite_count": 3, "quote_count": 1 },
                { "id_str": "0", "created_at": days_ago(90), "user": { "screen_name": "old" } }
            ],
            "next_cursor": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let config = config_for(&server, &out);
    let summary = run(&config).await.expect("run succeeds");

    assert_eq!(summary.tweets, 3);
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.stop, StopReason::LastPage);
    assert_eq!(summary.authors, 2);
    assert_eq!(summary.totals.posts, 3);

    let raw = read(&config.output.tweets);
    let ids: Vec<&str> = raw
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id_str"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["3", "2", "1"]);
    assert_eq!(raw[1].get("views_count"), Some(&Value::Null));

    let board = read(&config.output.leaderboard);
    assert_eq!(
        board,
        json!([
            ["анна", { "posts": 2, "likes": 8, "retweets": 0, "comments": 0, "quotes": 1, "views": 100 }],
            ["bob", { "posts": 1, "likes": 0, "retweets": 2, "comments": 1, "quotes": 0, "views": 0 }]
        ])
    );
    let board_text = fs::read_to_string(&config.output.leaderboard).unwrap();
    assert!(board_text.contains("анна"));

    let daily = read(&config.output.daily);
    let total: u64 = daily
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["posts"].as_u64().unwrap())
        .sum();
    assert_eq!(total, 3);
}

#[tokio::test]
#[serial]
async fn http_failure_aborts_without_writing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .expect(1)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let config = config_for(&server, &out);
    let err = run(&config).await.unwrap_err();

    assert!(format!("{err:#}").contains("boom"));
    assert!(!config.output.tweets.exists());
    assert!(!config.output.leaderboard.exists());
    assert!(!config.output.daily.exists());
}

#[test]
#[serial]
fn rebuilding_from_snapshot_is_byte_identical() {
    let out = TempDir::new().unwrap();
    let paths = pulse_config::OutputPaths {
        tweets: out.path().join("all_tweets.json"),
        leaderboard: out.path().join("leaderboard.json"),
        daily: out.path().join("daily_stats.json"),
    };
    fs::write(
        &paths.tweets,
        serde_json::to_string_pretty(&json!([
            { "id": "1", "created_at": "2024-01-01T00:00:00Z", "user": { "screen_name": "a" }, "favorite_count": 5 },
            { "id": "2", "created_at": "2024-01-01T00:00:00Z", "user": { "screen_name": "a" }, "favorite_count": 3 }
        ]))
        .unwrap(),
    )
    .unwrap();

    rebuild_from_snapshot(&paths).unwrap();
    let board_first = fs::read(&paths.leaderboard).unwrap();
    let daily_first = fs::read(&paths.daily).unwrap();

    rebuild_from_snapshot(&paths).unwrap();
    assert_eq!(fs::read(&paths.leaderboard).unwrap(), board_first);
    assert_eq!(fs::read(&paths.daily).unwrap(), daily_first);

    assert_eq!(
        read(&paths.leaderboard),
        json!([["a", { "posts": 2, "likes": 8, "retweets": 0, "comments": 0, "quotes": 0, "views": 0 }]])
    );
    assert_eq!(read(&paths.daily), json!([{ "date": "2024-01-01", "posts": 2 }]));
}
