use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// One page of `GET twitter/community/{id}/tweets`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TweetPage {
    #[serde(default)]
    pub tweets: Option<Vec<Tweet>>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl TweetPage {
    /// Next cursor, with empty strings treated as "no more pages".
    pub fn cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref().filter(|c| !c.is_empty())
    }

    pub fn into_parts(self) -> (Vec<Tweet>, Option<String>) {
        let next = self.next_cursor.filter(|c| !c.is_empty());
        (self.tweets.unwrap_or_default(), next)
    }
}

/// The API sends the numeric id alongside `id_str`; older dumps only carry one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TweetId {
    Num(u64),
    Str(String),
}

/// A tweet as returned by the API.
///
/// The object is kept exactly as received and serializes back to it, nulls and
/// key order included. The handful of fields the aggregations read are decoded
/// once into a typed view.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct Tweet {
    raw: Value,
    fields: TweetFields,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
struct TweetFields {
    #[serde(default)]
    id_str: Option<String>,
    #[serde(default)]
    id: Option<TweetId>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    user: Option<Author>,
    // Some exports nest the author under `author` instead of `user`.
    #[serde(default)]
    author: Option<Author>,
    #[serde(default)]
    favorite_count: Option<u64>,
    #[serde(default)]
    retweet_count: Option<u64>,
    #[serde(default)]
    reply_count: Option<u64>,
    #[serde(default)]
    quote_count: Option<u64>,
    #[serde(default)]
    views_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub screen_name: Option<String>,
}

impl Author {
    fn name(&self) -> Option<&str> {
        self.screen_name.as_deref().filter(|s| !s.is_empty())
    }
}

impl TryFrom<Value> for Tweet {
    type Error = serde_json::Error;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        let fields = TweetFields::deserialize(&raw)?;
        Ok(Self { raw, fields })
    }
}

impl Serialize for Tweet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl Tweet {
    /// Stable identifier used for dedup: `id_str`, else the numeric/string `id`.
    pub fn key(&self) -> Option<String> {
        if let Some(s) = self.fields.id_str.as_deref().filter(|s| !s.is_empty()) {
            return Some(s.to_string());
        }
        match &self.fields.id {
            Some(TweetId::Num(n)) => Some(n.to_string()),
            Some(TweetId::Str(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// `user.screen_name`, falling back to `author.screen_name`.
    pub fn screen_name(&self) -> Option<&str> {
        self.fields
            .user
            .as_ref()
            .and_then(Author::name)
            .or_else(|| self.fields.author.as_ref().and_then(Author::name))
    }

    pub fn created_at(&self) -> Option<&str> {
        self.fields.created_at.as_deref()
    }

    /// `created_at` in UTC, or `None` when absent or unparseable.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at().and_then(parse_created_at)
    }

    /// Any top-level field, as the API sent it.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.raw.get(field)
    }

    pub fn likes(&self) -> u64 {
        self.fields.favorite_count.unwrap_or(0)
    }
    pub fn retweets(&self) -> u64 {
        self.fields.retweet_count.unwrap_or(0)
    }
    pub fn replies(&self) -> u64 {
        self.fields.reply_count.unwrap_or(0)
    }
    pub fn quotes(&self) -> u64 {
        self.fields.quote_count.unwrap_or(0)
    }
    pub fn views(&self) -> u64 {
        self.fields.views_count.unwrap_or(0)
    }
}

const LEGACY_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";
const NAIVE_ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Accepts RFC 3339, the legacy `Wed Oct 10 20:19:24 +0000 2018` form, and
/// zone-less ISO timestamps (read as UTC).
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, LEGACY_FORMAT) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, NAIVE_ISO_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
