use super::SocialProvider;
use crate::config::BotConfig;
use crate::error::ServiceError;
use crate::models::SocialPost;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

// Twitter/X API v2 recent search
const TWITTER_BASE: &str = "https://api.twitter.com";
const MIN_RESULTS: u32 = 10;
const MAX_RESULTS: u32 = 100;

#[derive(Clone)]
pub struct TwitterClient {
    client: Client,
    base_url: String,
    bearer_token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    /// Absent when nothing matched
    data: Option<Vec<Tweet>>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    text: String,
}

impl TwitterClient {
    pub fn new(config: &BotConfig) -> Result<Self, ServiceError> {
        Self::with_base_url(
            TWITTER_BASE,
            &config.credentials.twitter_bearer_token,
            config.http_timeout,
        )
    }

    pub fn with_base_url(
        base_url: &str,
        bearer_token: &str,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.to_string(),
        })
    }
}

#[async_trait]
impl SocialProvider for TwitterClient {
    async fn fetch_recent(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<SocialPost>, ServiceError> {
        // The endpoint rejects values outside 10..=100
        let max_results = max_results.clamp(MIN_RESULTS, MAX_RESULTS).to_string();

        let url = format!("{}/2/tweets/search/recent", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&[("query", query), ("max_results", max_results.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: SearchResponse = response.json().await?;
        let posts: Vec<SocialPost> = body
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|t| SocialPost { text: t.text })
            .collect();

        tracing::debug!("🐦 Fetched {} posts for {:?}", posts.len(), query);
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(server: &mockito::ServerGuard) -> TwitterClient {
        TwitterClient::with_base_url(&server.url(), "token", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_recent_posts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/2/tweets/search/recent")
            .match_header("authorization", "Bearer token")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "Bitcoin OR BTC".into()),
                Matcher::UrlEncoded("max_results".into(), "50".into()),
            ]))
            .with_body(
                r#"{"data":[{"id":"1","text":"BTC to the moon"},{"id":"2","text":"crypto is crashing"}],"meta":{"result_count":2}}"#,
            )
            .create_async()
            .await;

        let posts = client(&server)
            .fetch_recent("Bitcoin OR BTC", 50)
            .await
            .unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].text, "BTC to the moon");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_matches_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/2/tweets/search/recent")
            .match_query(Matcher::Any)
            .with_body(r#"{"meta":{"result_count":0}}"#)
            .create_async()
            .await;

        let posts = client(&server).fetch_recent("BTC", 50).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_max_results_is_clamped() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/2/tweets/search/recent")
            .match_query(Matcher::UrlEncoded("max_results".into(), "10".into()))
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        tokio_test::assert_ok!(client(&server).fetch_recent("BTC", 3).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/2/tweets/search/recent")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body(r#"{"title":"Too Many Requests"}"#)
            .create_async()
            .await;

        let result = client(&server).fetch_recent("BTC", 50).await;
        assert!(matches!(result, Err(ServiceError::Status { status: 429, .. })));
    }
}
