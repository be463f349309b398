// Text scoring and market sentiment aggregation
pub mod aggregator;
pub mod lexicon;
pub mod scoring;

pub use aggregator::{classify, SentimentAggregator};
pub use lexicon::Lexicon;
pub use scoring::{clean_text, compound_score, item_score, polarity_score};
