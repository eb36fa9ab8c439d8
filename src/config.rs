// ⚙️ Configuration - one explicit struct handed to every stage
// Loaded from an optional JSON file, then overlaid with environment variables

use crate::aggregator::AspectNaming;
use anyhow::{bail, Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_DB_PATH: &str = "FEEDBACK_DB";

// ============================================================================
// PIPELINE CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file holding reviews and analysis tables
    pub db_path: PathBuf,

    /// Input table and its columns
    pub reviews_table: String,
    pub id_column: String,
    pub text_column: String,

    /// Output table for the lexicon stage
    pub lexicon_table: String,

    /// Output table for the model extraction stage
    pub analysis_table: String,

    /// Product name shown in the report header
    pub product_name: String,

    /// Rows shown in the aspect table
    pub top_aspects: usize,

    /// Negative themes listed by the lexicon stage
    pub top_themes: usize,

    /// Words ignored when counting negative themes
    pub theme_filter_words: Vec<String>,

    pub aspect_naming: AspectNaming,

    pub extractor: ExtractorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from("feedback.db"),
            reviews_table: "reviews".to_string(),
            id_column: "id".to_string(),
            text_column: "review_text".to_string(),
            lexicon_table: "reviews_with_lexicon_sentiment".to_string(),
            analysis_table: "reviews_with_openai_analysis".to_string(),
            product_name: "Apple Vision Pro".to_string(),
            top_aspects: 10,
            top_themes: 10,
            theme_filter_words: [
                "apple", "vision", "pro", "headset", "device", "really", "much", "time", "like", "get",
            ]
            .iter()
            .map(|w| w.to_string())
            .collect(),
            aspect_naming: AspectNaming::Exact,
            extractor: ExtractorConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a JSON file; missing fields fall back to defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        Ok(config)
    }

    /// Defaults, or the given file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Config::from_file(p)?,
            None => Config::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Pull secrets and the DB location from the environment
    pub fn apply_env(&mut self) {
        if let Ok(key) = env::var(ENV_API_KEY) {
            if !key.trim().is_empty() {
                self.extractor.api_key = Some(key);
            }
        }
        if let Ok(db) = env::var(ENV_DB_PATH) {
            if !db.trim().is_empty() {
                self.db_path = PathBuf::from(db);
            }
        }
    }

    /// Table and column names are spliced into SQL, so they must be plain identifiers
    pub fn validate(&self) -> Result<()> {
        for (what, name) in [
            ("reviews_table", &self.reviews_table),
            ("id_column", &self.id_column),
            ("text_column", &self.text_column),
            ("lexicon_table", &self.lexicon_table),
            ("analysis_table", &self.analysis_table),
        ] {
            if !is_sql_identifier(name) {
                bail!("Invalid {}: {:?} is not a plain SQL identifier", what, name);
            }
        }

        if self.extractor.max_attempts == 0 {
            bail!("extractor.max_attempts must be at least 1");
        }

        Ok(())
    }
}

// ============================================================================
// EXTRACTOR CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub model: String,

    /// Base URL of an OpenAI-compatible API
    pub api_base: String,

    /// Never written back out; comes from the environment or .env
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    pub temperature: f32,

    /// Pause after every review
    pub request_delay_ms: u64,

    /// Pause after the first failed attempt; doubles on each retry
    pub failure_pause_ms: u64,

    /// Attempts per review before it is skipped
    pub max_attempts: u32,

    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            model: "gpt-3.5-turbo-1106".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            temperature: 0.0,
            request_delay_ms: 500,
            failure_pause_ms: 2000,
            max_attempts: 1,
            timeout_secs: 60,
        }
    }
}

pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ============================================================================
// TESTS
// ============================================================================
