use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::error::ParseError;

const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub screen_name: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ExtendedText {
    full_text: String,
}

/// Typed view over the fields of a post payload that this crate reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id_str: Option<String>,
    #[serde(default)]
    full_text: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    extended_tweet: Option<ExtendedText>,
    #[serde(default)]
    pub retweeted: bool,
    #[serde(default)]
    pub retweeted_status: Option<Box<Post>>,
    #[serde(default)]
    pub user: Option<Author>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Post {
    /// The post's own text, preferring the untruncated form.
    pub fn own_text(&self) -> Option<&str> {
        self.extended_tweet
            .as_ref()
            .map(|e| e.full_text.as_str())
            .or(self.full_text.as_deref())
            .or(self.text.as_deref())
    }

    pub fn is_reshare(&self) -> bool {
        self.retweeted || self.retweeted_status.is_some()
    }

    /// Text to analyze: the original post's text for a reshare, otherwise our own.
    pub fn resolved_text(&self) -> Option<&str> {
        self.retweeted_status
            .as_ref()
            .and_then(|original| original.own_text())
            .or_else(|| self.own_text())
    }

    pub fn created(&self) -> Option<DateTime<FixedOffset>> {
        let created_at = self.created_at.as_deref()?;
        DateTime::parse_from_str(created_at, CREATED_AT_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(created_at))
            .ok()
    }
}

/// A post exactly as received from the platform, plus its typed view.
///
/// Serializes back to the untouched payload, so persisted batches hold the
/// original records rather than anything derived from them.
#[derive(Debug, Clone)]
pub struct RawRecord {
    value: Value,
    post: Post,
}

impl RawRecord {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ParseError::Empty);
        }
        let value: Value = serde_json::from_str(raw).map_err(ParseError::Json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ParseError> {
        if !value.is_object() {
            return Err(ParseError::NotAnObject);
        }
        let post = Post::deserialize(&value).map_err(ParseError::Shape)?;
        if post.own_text().is_none() {
            return Err(ParseError::MissingText);
        }
        Ok(Self { value, post })
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn text(&self) -> &str {
        self.post.own_text().unwrap_or_default()
    }

    pub fn resolved_text(&self) -> &str {
        self.post.resolved_text().unwrap_or_default()
    }

    pub fn author(&self) -> Option<&str> {
        self.post.user.as_ref().map(|u| u.screen_name.as_str())
    }
}

impl Serialize for RawRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

/// Ordered records gathered during one streaming run.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct CollectedBatch {
    records: Vec<RawRecord>,
}

impl CollectedBatch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, record: RawRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<RawRecord> {
        self.records
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn value(self) -> i64 {
        match self {
            SentimentLabel::Positive => 1,
            SentimentLabel::Neutral => 0,
            SentimentLabel::Negative => -1,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Overall tone of a set of posts, carrying the label sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolarityVerdict {
    Positive(i64),
    Neutral(i64),
    Negative(i64),
}

impl PolarityVerdict {
    pub fn from_labels<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = SentimentLabel>,
    {
        let sum: i64 = labels.into_iter().map(SentimentLabel::value).sum();
        match sum {
            s if s > 0 => PolarityVerdict::Positive(s),
            s if s < 0 => PolarityVerdict::Negative(s),
            s => PolarityVerdict::Neutral(s),
        }
    }

    pub fn sum(self) -> i64 {
        match self {
            PolarityVerdict::Positive(s) | PolarityVerdict::Neutral(s) | PolarityVerdict::Negative(s) => s,
        }
    }
}

impl fmt::Display for PolarityVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolarityVerdict::Positive(s) => write!(f, "Positive({})", s),
            PolarityVerdict::Neutral(s) => write!(f, "Neutral({})", s),
            PolarityVerdict::Negative(s) => write!(f, "Negative({})", s),
        }
    }
}
