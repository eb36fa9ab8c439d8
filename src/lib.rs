// Review Insights - Core Library
// Lexicon and model-based review sentiment, aspect aggregation, reporting

pub mod sentiment;
pub mod config;
pub mod db;
pub mod normalizer;
pub mod lexicon;
pub mod themes;
pub mod extractor;
pub mod aggregator;  // Aspect aggregation (net scores, orderings)
pub mod report;
pub mod pipeline;

// Re-export commonly used types
pub use sentiment::{Sentiment, SentimentDistribution};
pub use config::{Config, ExtractorConfig};
pub use db::{
    Review, AspectAnalysisRow,
    open_database, open_existing, setup_reviews_table, load_csv, insert_reviews, load_reviews,
    replace_lexicon_results, replace_aspect_analysis, load_aspect_analysis,
};
pub use normalizer::{TextNormalizer, CleanedReview};
pub use lexicon::{LexiconScorer, LexiconScores, LexiconSentiment, SentimentScorer};
pub use themes::{Theme, top_negative_themes};
pub use extractor::{
    AspectExtractor, OpenAiExtractor, ExtractionResult, BatchOutcome, extract_batch,
};
pub use aggregator::{
    AspectAggregator, AspectAggregate, AspectRecord, AspectSummary, AspectNaming, PayloadIssue,
};
pub use report::{ReportInput, render_report};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
