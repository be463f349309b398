use super::lexicon::Lexicon;
use super::scoring::item_score;
use crate::api::{NewsProvider, SocialProvider};
use crate::config::FeedSettings;
use crate::models::{SentimentLabel, SentimentReading};
use chrono::Utc;

const NEWS_WEIGHT: f64 = 0.6;
const SOCIAL_WEIGHT: f64 = 0.4;
/// Scores strictly beyond +/- this are labeled bullish/bearish
const LABEL_THRESHOLD: f64 = 0.10;

/// Label an overall score; exactly +/-0.10 stays neutral
pub fn classify(score: f64) -> SentimentLabel {
    if score > LABEL_THRESHOLD {
        SentimentLabel::Bullish
    } else if score < -LABEL_THRESHOLD {
        SentimentLabel::Bearish
    } else {
        SentimentLabel::Neutral
    }
}

/// Mean of the item scores; an empty stream counts as 0
pub fn stream_score(item_scores: &[f64]) -> f64 {
    if item_scores.is_empty() {
        return 0.0;
    }
    item_scores.iter().sum::<f64>() / item_scores.len() as f64
}

/// Weighted news/social blend, clamped to [-1, 1]
pub fn combine(news_score: f64, social_score: f64) -> f64 {
    (news_score * NEWS_WEIGHT + social_score * SOCIAL_WEIGHT).clamp(-1.0, 1.0)
}

/// Builds a `SentimentReading` from the news and social feeds
pub struct SentimentAggregator {
    news: Box<dyn NewsProvider>,
    social: Box<dyn SocialProvider>,
    lexicon: Lexicon,
    feeds: FeedSettings,
}

impl SentimentAggregator {
    pub fn new(
        news: Box<dyn NewsProvider>,
        social: Box<dyn SocialProvider>,
        feeds: FeedSettings,
    ) -> Self {
        Self {
            news,
            social,
            lexicon: Lexicon::new(),
            feeds,
        }
    }

    pub fn with_lexicon(mut self, lexicon: Lexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    /// Fetch both feeds and compute the current market sentiment.
    ///
    /// Feed failures are logged and treated as an empty stream, so this
    /// always produces a reading.
    pub async fn refresh(&self) -> SentimentReading {
        let news_scores = self.score_news().await;
        let social_scores = self.score_social().await;

        let news_score = stream_score(&news_scores);
        let social_score = stream_score(&social_scores);
        let score = combine(news_score, social_score);

        let reading = SentimentReading {
            score,
            label: classify(score),
            news_score,
            social_score,
            news_count: news_scores.len(),
            social_count: social_scores.len(),
            timestamp: Utc::now(),
        };

        tracing::debug!(
            news_score,
            news_count = reading.news_count,
            social_score,
            social_count = reading.social_count,
            "Sentiment streams scored"
        );

        reading
    }

    async fn score_news(&self) -> Vec<f64> {
        let items = match self
            .news
            .fetch_recent(&self.feeds.news_query, self.feeds.news_lookback_hours)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("News fetch failed, scoring stream as empty: {}", e);
                Vec::new()
            }
        };

        items
            .iter()
            .take(self.feeds.news_max_articles)
            .map(|item| item_score(&self.lexicon, &item.content()))
            .collect()
    }

    async fn score_social(&self) -> Vec<f64> {
        let posts = match self
            .social
            .fetch_recent(&self.feeds.social_query, self.feeds.social_max_results)
            .await
        {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!("Social fetch failed, scoring stream as empty: {}", e);
                Vec::new()
            }
        };

        posts
            .iter()
            .map(|post| item_score(&self.lexicon, &post.text))
            .collect()
    }
}
