use super::NewsProvider;
use crate::config::BotConfig;
use crate::error::ServiceError;
use crate::models::NewsItem;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

// NewsAPI "everything" search
// Docs: https://newsapi.org/docs/endpoints/everything
const NEWSAPI_BASE: &str = "https://newsapi.org";
/// Largest page NewsAPI serves in one request
const MAX_PAGE_SIZE: usize = 100;

#[derive(Clone)]
pub struct NewsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    page_size: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    articles: Vec<Article>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    description: Option<String>,
}

impl NewsApiClient {
    pub fn new(config: &BotConfig) -> Result<Self, ServiceError> {
        Self::with_base_url(
            NEWSAPI_BASE,
            &config.credentials.news_api_key,
            config.feeds.news_max_articles,
            config.http_timeout,
        )
    }

    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        page_size: usize,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sentibot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        })
    }
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    async fn fetch_recent(
        &self,
        query: &str,
        lookback_hours: u32,
    ) -> Result<Vec<NewsItem>, ServiceError> {
        let from = (Utc::now() - ChronoDuration::hours(i64::from(lookback_hours)))
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let page_size = self.page_size.to_string();

        let url = format!("{}/v2/everything", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", query),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("from", from.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: EverythingResponse = response.json().await?;
        if body.status != "ok" {
            return Err(ServiceError::Api {
                code: 0,
                message: format!(
                    "{}: {}",
                    body.code.unwrap_or_else(|| "error".to_string()),
                    body.message.unwrap_or_default()
                ),
            });
        }

        let items: Vec<NewsItem> = body
            .articles
            .into_iter()
            .take(self.page_size)
            .map(|a| NewsItem {
                title: a.title.unwrap_or_default(),
                description: a.description.unwrap_or_default(),
            })
            .collect();

        tracing::debug!("📰 Fetched {} news articles for {:?}", items.len(), query);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(server: &mockito::ServerGuard, page_size: usize) -> NewsApiClient {
        NewsApiClient::with_base_url(&server.url(), "news-key", page_size, Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_recent_articles() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/everything")
            .match_header("X-Api-Key", "news-key")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "crypto Bitcoin".into()),
                Matcher::UrlEncoded("language".into(), "en".into()),
                Matcher::UrlEncoded("pageSize".into(), "20".into()),
            ]))
            .with_body(
                r#"{"status":"ok","totalResults":3,"articles":[
                    {"title":"Bitcoin surges","description":"Record gains today"},
                    {"title":"Ether steady","description":null},
                    {"title":null,"description":null}
                ]}"#,
            )
            .create_async()
            .await;

        let items = client(&server, 20)
            .fetch_recent("crypto Bitcoin", 24)
            .await
            .unwrap();

        // Articles without text still count toward the news average
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].content(), "Bitcoin surges Record gains today");
        assert_eq!(items[1].description, "");
        assert_eq!(items[2].title, "");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_truncates_to_page_size() {
        let mut server = mockito::Server::new_async().await;
        let articles: Vec<String> = (0..5)
            .map(|i| format!(r#"{{"title":"Story {}","description":"text"}}"#, i))
            .collect();
        server
            .mock("GET", "/v2/everything")
            .match_query(Matcher::Any)
            .with_body(format!(
                r#"{{"status":"ok","articles":[{}]}}"#,
                articles.join(",")
            ))
            .create_async()
            .await;

        let items = client(&server, 3).fetch_recent("crypto", 24).await.unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[2].title, "Story 2");
    }

    #[tokio::test]
    async fn test_error_status_in_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/everything")
            .match_query(Matcher::Any)
            .with_body(r#"{"status":"error","code":"rateLimited","message":"Too many requests"}"#)
            .create_async()
            .await;

        let result = client(&server, 20).fetch_recent("crypto", 24).await;

        match result {
            Err(ServiceError::Api { message, .. }) => assert!(message.contains("rateLimited")),
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/everything")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"status":"error","code":"apiKeyInvalid"}"#)
            .create_async()
            .await;

        let result = client(&server, 20).fetch_recent("crypto", 24).await;
        assert!(matches!(result, Err(ServiceError::Status { status: 401, .. })));
    }
}
