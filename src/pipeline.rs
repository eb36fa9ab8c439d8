// 🔗 Pipeline Stages - each stage reads from SQLite, computes, writes back
//
// Stages share nothing in memory; all hand-off goes through the database.
//   import   CSV → reviews
//   lexicon  reviews → clean → score → lexicon table (+ negative themes)
//   extract  reviews → model → analysis table
//   report   analysis table → aggregate → text report

use crate::aggregator::AspectAggregator;
use crate::config::Config;
use crate::db::{self, Review};
use crate::extractor::{extract_batch, AspectExtractor, BatchOutcome};
use crate::lexicon::{LexiconSentiment, SentimentScorer};
use crate::normalizer::TextNormalizer;
use crate::report::{overall_distribution, render_report, ReportInput};
use crate::sentiment::{Sentiment, SentimentDistribution};
use crate::themes::{top_negative_themes, Theme};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::fmt::Write;
use std::path::Path;

/// Fresh identifier stamped into every row a stage writes
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ============================================================================
// IMPORT
// ============================================================================

pub fn run_import(conn: &Connection, config: &Config, csv_path: &Path) -> Result<usize> {
    let reviews = db::load_csv(csv_path)?;
    log::info!("Loaded {} reviews from {:?}", reviews.len(), csv_path);

    db::setup_reviews_table(conn, config)?;
    db::insert_reviews(conn, config, &reviews)
}

// ============================================================================
// LEXICON
// ============================================================================

#[derive(Debug, Clone)]
pub struct LexiconOutcome {
    pub results: Vec<LexiconSentiment>,
    pub distribution: SentimentDistribution,
    pub themes: Vec<Theme>,
}

impl LexiconOutcome {
    /// Distribution and negative themes, as printed after the stage
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out).expect("writing to a String cannot fail");
        out
    }

    fn write_to(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "--- SUMMARY OF FINDINGS ---")?;
        writeln!(out)?;
        writeln!(out, "1. Sentiment Distribution:")?;
        for sentiment in Sentiment::ALL {
            writeln!(
                out,
                "{:<10} {:>6.2}%",
                sentiment.as_str(),
                self.distribution.percentage(sentiment)
            )?;
        }

        writeln!(out)?;
        writeln!(out, "2. Top {} Themes in NEGATIVE Feedback:", self.themes.len())?;
        if self.themes.is_empty() {
            writeln!(out, "   (no negative reviews)")?;
        }
        for (i, theme) in self.themes.iter().enumerate() {
            writeln!(out, "{:>3}. {:<20} {:>5}", i + 1, theme.word, theme.frequency)?;
        }
        Ok(())
    }
}

pub fn score_reviews<S: SentimentScorer + ?Sized>(
    reviews: &[Review],
    normalizer: &TextNormalizer,
    scorer: &S,
) -> Vec<LexiconSentiment> {
    reviews
        .iter()
        .map(|r| scorer.analyze(&normalizer.clean_review(r.id, &r.text)))
        .collect()
}

pub fn run_lexicon<S: SentimentScorer + ?Sized>(
    conn: &Connection,
    config: &Config,
    scorer: &S,
    run_id: &str,
) -> Result<LexiconOutcome> {
    let reviews = db::load_reviews(conn, config)?;
    log::info!("Loaded {} reviews from {}", reviews.len(), config.reviews_table);

    let normalizer = TextNormalizer::new();
    let results = score_reviews(&reviews, &normalizer, scorer);

    let saved = db::replace_lexicon_results(conn, config, run_id, &results)?;
    log::info!("Saved {} lexicon results to {}", saved, config.lexicon_table);

    let distribution = SentimentDistribution::from_sentiments(results.iter().map(|r| r.final_sentiment));
    let themes = top_negative_themes(&results, &config.theme_filter_words, config.top_themes);

    Ok(LexiconOutcome {
        results,
        distribution,
        themes,
    })
}

// ============================================================================
// EXTRACT
// ============================================================================

/// Run the extractor over every review. The analysis table is only
/// replaced when at least one review succeeded.
pub fn run_extract<E: AspectExtractor + ?Sized>(
    conn: &Connection,
    config: &Config,
    extractor: &E,
    run_id: &str,
) -> Result<BatchOutcome> {
    let reviews = db::load_reviews(conn, config)?;
    log::info!("Loaded {} reviews from {}", reviews.len(), config.reviews_table);

    let outcome = extract_batch(extractor, &reviews, &config.extractor);

    if outcome.rows.is_empty() {
        log::warn!("No successful analysis results to save");
        return Ok(outcome);
    }

    let saved = db::replace_aspect_analysis(conn, config, run_id, &outcome.rows)?;
    log::info!("Saved {} results to {}", saved, config.analysis_table);

    Ok(outcome)
}

// ============================================================================
// REPORT
// ============================================================================

pub fn build_report(conn: &Connection, config: &Config, generated_at: DateTime<Utc>) -> Result<String> {
    let rows = db::load_aspect_analysis(conn, config)?;
    log::info!("Loaded {} analyzed reviews from {}", rows.len(), config.analysis_table);

    let summary = AspectAggregator::new(config.aspect_naming).summarize(&rows);
    log::info!("{}", summary.summary());

    let input = ReportInput {
        product_name: &config.product_name,
        generated_at,
        overall: overall_distribution(&rows),
        aspects: &summary,
        top_n: config.top_aspects,
    };

    Ok(render_report(&input))
}

// ============================================================================
// TESTS
// ============================================================================
