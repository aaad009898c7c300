use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::config::Authenticator;
use crate::error::TimelineError;
use crate::models::RawRecord;

/// Largest page the timeline endpoint serves in one request.
pub const MAX_PAGE_SIZE: usize = 200;

/// Pull source for historical posts. `None` means the authenticated caller.
#[async_trait]
pub trait TimelineSource: Send + Sync {
    async fn fetch_timeline(
        &self,
        account: Option<&str>,
        count: usize,
    ) -> Result<Vec<RawRecord>, TimelineError>;
}

pub struct HttpTimelineSource {
    client: Client,
    authenticator: Authenticator,
    base_url: Url,
}

impl HttpTimelineSource {
    pub fn new(authenticator: Authenticator, base_url: Url) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            authenticator,
            base_url,
        })
    }

    fn timeline_url(&self, account: Option<&str>, count: usize) -> String {
        let mut url = format!(
            "{}/statuses/user_timeline.json?count={}&tweet_mode=extended",
            self.base_url.as_str().trim_end_matches('/'),
            count
        );
        if let Some(account) = account {
            url.push_str(&format!("&screen_name={}", urlencoding::encode(account)));
        }
        url
    }
}

#[async_trait]
impl TimelineSource for HttpTimelineSource {
    async fn fetch_timeline(
        &self,
        account: Option<&str>,
        count: usize,
    ) -> Result<Vec<RawRecord>, TimelineError> {
        let response = self
            .client
            .get(self.timeline_url(account, count))
            .header(AUTHORIZATION, self.authenticator.authorization())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TimelineError::AccountNotFound {
                account: account.unwrap_or("(authenticated user)").to_string(),
            });
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(TimelineError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let values = response.json::<Vec<serde_json::Value>>().await?;
        debug!(received = values.len(), "timeline page received");

        Ok(values
            .into_iter()
            .filter_map(|value| match RawRecord::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "skipping malformed timeline entry");
                    None
                }
            })
            .collect())
    }
}

/// A timeline post with its analysis text already resolved.
#[derive(Debug, Clone)]
pub struct TimelinePost {
    pub id: Option<String>,
    pub author: Option<String>,
    pub created: Option<DateTime<FixedOffset>>,
    pub text: String,
}

impl From<&RawRecord> for TimelinePost {
    fn from(record: &RawRecord) -> Self {
        Self {
            id: record.post().id_str.clone(),
            author: record.author().map(String::from),
            created: record.post().created(),
            text: record.resolved_text().to_string(),
        }
    }
}

pub struct TimelineFetcher<S> {
    source: S,
}

impl<S: TimelineSource> TimelineFetcher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Up to `count` posts, most recent first, in one request.
    pub async fn fetch(
        &self,
        account: Option<&str>,
        count: usize,
    ) -> Result<Vec<TimelinePost>, TimelineError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let account = account.map(str::trim).filter(|a| !a.is_empty());
        let page = count.min(MAX_PAGE_SIZE);

        let records = self.source.fetch_timeline(account, page).await?;
        let mut posts: Vec<TimelinePost> = records.iter().map(TimelinePost::from).collect();

        // Stable: posts without a parseable timestamp keep their order, last.
        posts.sort_by(|a, b| b.created.cmp(&a.created));
        posts.truncate(page);
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubSource {
        records: Vec<&'static str>,
        missing: &'static [&'static str],
        calls: Mutex<Vec<(Option<String>, usize)>>,
    }

    impl StubSource {
        fn new(records: Vec<&'static str>) -> Self {
            Self {
                records,
                missing: &["ghost"],
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TimelineSource for StubSource {
        async fn fetch_timeline(
            &self,
            account: Option<&str>,
            count: usize,
        ) -> Result<Vec<RawRecord>, TimelineError> {
            self.calls
                .lock()
                .unwrap()
                .push((account.map(String::from), count));
            if let Some(account) = account.filter(|a| self.missing.iter().any(|m| m == a)) {
                return Err(TimelineError::AccountNotFound {
                    account: account.to_string(),
                });
            }
            Ok(self
                .records
                .iter()
                .map(|raw| RawRecord::parse(raw).unwrap())
                .collect())
        }
    }

    #[tokio::test]
    async fn test_fetch_orders_most_recent_first_and_truncates() {
        let fetcher = TimelineFetcher::new(StubSource::new(vec![
            r#"{"id_str":"1","text":"old","created_at":"Mon Jan 01 10:00:00 +0000 2024"}"#,
            r#"{"id_str":"3","text":"newest","created_at":"Wed Jan 03 10:00:00 +0000 2024"}"#,
            r#"{"id_str":"2","text":"middle","created_at":"Tue Jan 02 10:00:00 +0000 2024"}"#,
        ]));

        let posts = fetcher.fetch(Some("alice"), 2).await.unwrap();

        let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["newest", "middle"]);
        assert_eq!(
            fetcher.source.calls.lock().unwrap().as_slice(),
            [(Some("alice".to_string()), 2)]
        );
    }

    #[tokio::test]
    async fn test_fetch_resolves_reshares() {
        let fetcher = TimelineFetcher::new(StubSource::new(vec![
            r#"{"full_text":"RT @bob: hello wor…","retweeted":true,
                "retweeted_status":{"full_text":"hello world http://x.co @bob!!"}}"#,
        ]));

        let posts = fetcher.fetch(None, 20).await.unwrap();

        assert_eq!(posts[0].text, "hello world http://x.co @bob!!");
    }

    #[tokio::test]
    async fn test_blank_account_means_authenticated_user() {
        let fetcher = TimelineFetcher::new(StubSource::new(vec![]));
        fetcher.fetch(Some("   "), 5).await.unwrap();
        assert_eq!(fetcher.source.calls.lock().unwrap()[0], (None, 5));
    }

    #[tokio::test]
    async fn test_account_not_found() {
        let fetcher = TimelineFetcher::new(StubSource::new(vec![]));
        let err = fetcher.fetch(Some("ghost"), 5).await.unwrap_err();
        assert!(matches!(err, TimelineError::AccountNotFound { ref account } if account == "ghost"));
    }

    #[tokio::test]
    async fn test_zero_count_skips_request() {
        let fetcher = TimelineFetcher::new(StubSource::new(vec![]));
        assert!(fetcher.fetch(Some("alice"), 0).await.unwrap().is_empty());
        assert!(fetcher.source.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_is_capped_to_page_size() {
        let fetcher = TimelineFetcher::new(StubSource::new(vec![]));
        fetcher.fetch(None, 5000).await.unwrap();
        assert_eq!(fetcher.source.calls.lock().unwrap()[0].1, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_timeline_url_encodes_account() {
        let source = HttpTimelineSource::new(
            Authenticator::new(crate::config::Credentials {
                bearer_token: "t".to_string(),
            }),
            Url::parse("https://api.example.com/1.1").unwrap(),
        )
        .unwrap();

        assert_eq!(
            source.timeline_url(Some("a b"), 20),
            "https://api.example.com/1.1/statuses/user_timeline.json?count=20&tweet_mode=extended&screen_name=a%20b"
        );
        assert_eq!(
            source.timeline_url(None, 5),
            "https://api.example.com/1.1/statuses/user_timeline.json?count=5&tweet_mode=extended"
        );
    }
}
