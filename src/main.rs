use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use review_insights::config::Config;
use review_insights::pipeline::{self, new_run_id};
use review_insights::{open_database, open_existing, LexiconScorer, OpenAiExtractor};

#[derive(Parser)]
#[command(name = "review-insights", version, about = "Review sentiment and aspect analysis")]
struct Cli {
    /// JSON config file (defaults are used for anything it omits)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database (overrides config and FEEDBACK_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import reviews from a CSV with id and review_text columns
    Import { csv: PathBuf },

    /// Clean and lexicon-score every review
    Lexicon,

    /// Run structured aspect extraction through the model API
    Extract {
        /// Attempts per review before it is skipped
        #[arg(long)]
        max_attempts: Option<u32>,
    },

    /// Aggregate aspects and print the analysis report
    Report {
        /// Rows in the aspect table
        #[arg(long)]
        top: Option<usize>,
    },
}

fn main() {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    if let Err(e) = run() {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    match cli.command {
        Command::Import { csv } => run_import(&config, &csv),
        Command::Lexicon => run_lexicon(&config),
        Command::Extract { max_attempts } => {
            if let Some(n) = max_attempts {
                config.extractor.max_attempts = n;
                config.validate()?;
            }
            run_extract(&config)
        }
        Command::Report { top } => {
            if let Some(n) = top {
                config.top_aspects = n;
            }
            run_report(&config)
        }
    }
}

fn run_import(config: &Config, csv: &Path) -> Result<()> {
    println!("🗄️  Import: CSV → {:?}", config.db_path);

    let conn = open_database(&config.db_path)?;
    let inserted = pipeline::run_import(&conn, config, csv)?;

    println!("✓ Inserted {} new reviews into {}", inserted, config.reviews_table);
    Ok(())
}

fn run_lexicon(config: &Config) -> Result<()> {
    println!("📖 Lexicon sentiment analysis");

    let conn = open_existing(&config.db_path)?;
    let run_id = new_run_id();
    log::info!("Run {}", run_id);

    let outcome = pipeline::run_lexicon(&conn, config, &LexiconScorer::new(), &run_id)?;

    println!("✓ Scored {} reviews → {}", outcome.results.len(), config.lexicon_table);
    println!();
    print!("{}", outcome.render());
    Ok(())
}

fn run_extract(config: &Config) -> Result<()> {
    println!("🤖 Model aspect extraction (this may take a few minutes)");

    let conn = open_existing(&config.db_path)?;
    let extractor = OpenAiExtractor::new(&config.extractor)?;
    let run_id = new_run_id();
    log::info!("Run {}", run_id);

    let outcome = pipeline::run_extract(&conn, config, &extractor, &run_id)?;

    if outcome.rows.is_empty() {
        println!("⚠️  No successful analysis results to save.");
    } else {
        println!("✓ {} → {}", outcome.summary(), config.analysis_table);
        println!("  You can now run the report command.");
    }
    if !outcome.failed.is_empty() {
        println!("⚠️  Skipped reviews: {:?}", outcome.failed);
    }
    Ok(())
}

fn run_report(config: &Config) -> Result<()> {
    let conn = open_existing(&config.db_path)?;
    let report = pipeline::build_report(&conn, config, Utc::now())?;

    println!();
    print!("{}", report);
    Ok(())
}
