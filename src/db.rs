use crate::config::Config;
use crate::lexicon::LexiconSentiment;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A raw review as ingested. Immutable once stored.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Review {
    pub id: i64,

    #[serde(alias = "review_text", alias = "text")]
    pub text: String,
}

/// One row of the model-extraction table.
/// `aspect_data_json` holds the serialized aspect list exactly as the model returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectAnalysisRow {
    pub review_id: i64,
    pub overall_sentiment: Option<String>,
    pub aspect_data_json: String,
}

// ============================================================================
// CONNECTION
// ============================================================================

/// Open (or create) the database and enable WAL
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database: {:?}", path))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}

/// Open a database that must already exist. Stages that read reviews use this
/// so a mistyped path fails instead of silently creating an empty file.
pub fn open_existing(path: &Path) -> Result<Connection> {
    if !path.exists() {
        bail!("Database not found: {:?}", path);
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open database: {:?}", path))?;
    Ok(conn)
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

// ============================================================================
// REVIEWS (input store, append-only)
// ============================================================================

pub fn setup_reviews_table(conn: &Connection, config: &Config) -> Result<()> {
    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                {id} INTEGER PRIMARY KEY,
                {text} TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            table = config.reviews_table,
            id = config.id_column,
            text = config.text_column,
        ),
        [],
    )?;
    Ok(())
}

/// Read reviews from a CSV with `id` and `review_text` (or `text`) headers
pub fn load_csv(csv_path: &Path) -> Result<Vec<Review>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open CSV file")?;

    let mut reviews = Vec::new();
    for result in rdr.deserialize() {
        let review: Review = result.context("Failed to deserialize review")?;
        reviews.push(review);
    }

    Ok(reviews)
}

/// Insert reviews, skipping ids that already exist. Returns the number inserted.
pub fn insert_reviews(conn: &Connection, config: &Config, reviews: &[Review]) -> Result<usize> {
    let sql = format!(
        "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
        config.reviews_table, config.id_column, config.text_column
    );
    let mut stmt = conn.prepare(&sql)?;

    let mut inserted = 0;
    let mut duplicates = 0;

    for review in reviews {
        match stmt.execute(params![review.id, review.text]) {
            Ok(_) => inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    log::info!("Inserted {} reviews, skipped {} duplicates", inserted, duplicates);

    Ok(inserted)
}

/// Load every review ordered by id. A missing table or column is fatal.
pub fn load_reviews(conn: &Connection, config: &Config) -> Result<Vec<Review>> {
    let sql = format!(
        "SELECT {id}, {text} FROM {table} ORDER BY {id}",
        id = config.id_column,
        text = config.text_column,
        table = config.reviews_table,
    );

    let mut stmt = conn.prepare(&sql).with_context(|| {
        format!(
            "Failed to read {}.{} / {}.{}",
            config.reviews_table, config.id_column, config.reviews_table, config.text_column
        )
    })?;

    let reviews = stmt
        .query_map([], |row| {
            let text: Option<String> = row.get(1)?;
            Ok(Review {
                id: row.get(0)?,
                text: text.unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(reviews)
}

// ============================================================================
// LEXICON RESULTS (replaced wholesale per run)
// ============================================================================

pub fn replace_lexicon_results(
    conn: &Connection,
    config: &Config,
    run_id: &str,
    results: &[LexiconSentiment],
) -> Result<usize> {
    let table = &config.lexicon_table;
    let analyzed_at = Utc::now().to_rfc3339();

    let tx = conn.unchecked_transaction()?;
    tx.execute(&format!("DROP TABLE IF EXISTS {}", table), [])?;
    tx.execute(
        &format!(
            "CREATE TABLE {} (
                review_id INTEGER PRIMARY KEY,
                cleaned_text TEXT NOT NULL,
                vader_compound REAL NOT NULL,
                textblob_polarity REAL NOT NULL,
                textblob_subjectivity REAL NOT NULL,
                final_sentiment TEXT NOT NULL,
                run_id TEXT NOT NULL,
                analyzed_at TEXT NOT NULL
            )",
            table
        ),
        [],
    )?;

    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} (
                review_id, cleaned_text, vader_compound, textblob_polarity,
                textblob_subjectivity, final_sentiment, run_id, analyzed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            table
        ))?;

        for r in results {
            stmt.execute(params![
                r.review_id,
                r.cleaned_text,
                r.vader_compound,
                r.textblob_polarity,
                r.textblob_subjectivity,
                r.final_sentiment.as_str(),
                run_id,
                analyzed_at,
            ])?;
        }
    }

    tx.commit()?;
    Ok(results.len())
}

// ============================================================================
// ASPECT ANALYSIS (intermediate store, replaced wholesale per run)
// ============================================================================

pub fn replace_aspect_analysis(
    conn: &Connection,
    config: &Config,
    run_id: &str,
    rows: &[AspectAnalysisRow],
) -> Result<usize> {
    let table = &config.analysis_table;
    let analyzed_at = Utc::now().to_rfc3339();

    let tx = conn.unchecked_transaction()?;
    tx.execute(&format!("DROP TABLE IF EXISTS {}", table), [])?;
    tx.execute(
        &format!(
            "CREATE TABLE {} (
                review_id INTEGER PRIMARY KEY,
                overall_sentiment TEXT,
                aspect_data_json TEXT,
                run_id TEXT NOT NULL,
                analyzed_at TEXT NOT NULL
            )",
            table
        ),
        [],
    )?;

    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} (review_id, overall_sentiment, aspect_data_json, run_id, analyzed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            table
        ))?;

        for row in rows {
            stmt.execute(params![
                row.review_id,
                row.overall_sentiment,
                row.aspect_data_json,
                run_id,
                analyzed_at,
            ])?;
        }
    }

    tx.commit()?;
    Ok(rows.len())
}

/// Load the intermediate rows ordered by review id.
/// A NULL payload comes back as an empty string, which the aggregator skips.
pub fn load_aspect_analysis(conn: &Connection, config: &Config) -> Result<Vec<AspectAnalysisRow>> {
    let table = &config.analysis_table;
    if !table_exists(conn, table)? {
        bail!("Table {} not found. Run the extract stage first.", table);
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT review_id, overall_sentiment, aspect_data_json FROM {} ORDER BY review_id",
        table
    ))?;

    let rows = stmt
        .query_map([], |row| {
            let payload: Option<String> = row.get(2)?;
            Ok(AspectAnalysisRow {
                review_id: row.get(0)?,
                overall_sentiment: row.get(1)?,
                aspect_data_json: payload.unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::Sentiment;
    use std::io::Write;

    fn review(id: i64, text: &str) -> Review {
        Review {
            id,
            text: text.to_string(),
        }
    }

    fn analysis_row(id: i64, overall: &str, payload: &str) -> AspectAnalysisRow {
        AspectAnalysisRow {
            review_id: id,
            overall_sentiment: Some(overall.to_string()),
            aspect_data_json: payload.to_string(),
        }
    }

    #[test]
    fn test_insert_reviews_skips_duplicate_ids() {
        let conn = Connection::open_in_memory().unwrap();
        let config = Config::default();
        setup_reviews_table(&conn, &config).unwrap();

        let reviews = vec![review(1, "Great display"), review(2, "Too heavy")];

        let inserted1 = insert_reviews(&conn, &config, &reviews).unwrap();
        let inserted2 = insert_reviews(&conn, &config, &reviews).unwrap();

        assert_eq!(inserted1, 2);
        assert_eq!(inserted2, 0);
        assert_eq!(count_rows(&conn, "reviews").unwrap(), 2);

        let loaded = load_reviews(&conn, &config).unwrap();
        assert_eq!(loaded, reviews);
    }

    #[test]
    fn test_load_reviews_missing_table_is_error() {
        let conn = Connection::open_in_memory().unwrap();
        let config = Config::default();

        assert!(load_reviews(&conn, &config).is_err());
    }

    #[test]
    fn test_load_reviews_custom_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE feedback (review_id INTEGER PRIMARY KEY, body TEXT)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO feedback (review_id, body) VALUES (5, 'ok'), (3, NULL)",
            [],
        )
        .unwrap();

        let config = Config {
            reviews_table: "feedback".to_string(),
            id_column: "review_id".to_string(),
            text_column: "body".to_string(),
            ..Config::default()
        };

        let loaded = load_reviews(&conn, &config).unwrap();

        assert_eq!(loaded, vec![review(3, ""), review(5, "ok")]);
    }

    #[test]
    fn test_load_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,review_text").unwrap();
        writeln!(file, "1,\"Love it, truly\"").unwrap();
        writeln!(file, "2,Battery dies fast").unwrap();

        let reviews = load_csv(file.path()).unwrap();

        assert_eq!(reviews, vec![review(1, "Love it, truly"), review(2, "Battery dies fast")]);
    }

    #[test]
    fn test_replace_aspect_analysis_replaces_not_appends() {
        let conn = Connection::open_in_memory().unwrap();
        let config = Config::default();

        let first = vec![
            analysis_row(1, "Positive", r#"[{"aspect":"Display","sentiment":"Positive"}]"#),
            analysis_row(2, "Negative", "[]"),
        ];
        replace_aspect_analysis(&conn, &config, "run-1", &first).unwrap();

        let second = vec![analysis_row(3, "Neutral", "[]")];
        replace_aspect_analysis(&conn, &config, "run-2", &second).unwrap();

        let loaded = load_aspect_analysis(&conn, &config).unwrap();
        assert_eq!(loaded, second);
    }

    #[test]
    fn test_load_aspect_analysis_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        let config = Config::default();

        let err = load_aspect_analysis(&conn, &config).unwrap_err();
        assert!(err.to_string().contains("reviews_with_openai_analysis"));
    }

    #[test]
    fn test_null_payload_loads_as_empty() {
        let conn = Connection::open_in_memory().unwrap();
        let config = Config::default();
        replace_aspect_analysis(&conn, &config, "run-1", &[]).unwrap();
        conn.execute(
            "INSERT INTO reviews_with_openai_analysis (review_id, overall_sentiment, aspect_data_json, run_id, analyzed_at)
             VALUES (9, NULL, NULL, 'r', 'now')",
            [],
        )
        .unwrap();

        let loaded = load_aspect_analysis(&conn, &config).unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].overall_sentiment, None);
        assert_eq!(loaded[0].aspect_data_json, "");
    }

    #[test]
    fn test_replace_lexicon_results() {
        let conn = Connection::open_in_memory().unwrap();
        let config = Config::default();

        let results = vec![LexiconSentiment {
            review_id: 1,
            cleaned_text: "great display".to_string(),
            vader_compound: 0.8,
            textblob_polarity: 0.8,
            textblob_subjectivity: 0.75,
            final_sentiment: Sentiment::Positive,
        }];

        replace_lexicon_results(&conn, &config, "run-1", &results).unwrap();
        replace_lexicon_results(&conn, &config, "run-2", &results).unwrap();

        assert_eq!(count_rows(&conn, &config.lexicon_table).unwrap(), 1);

        let (label, run): (String, String) = conn
            .query_row(
                "SELECT final_sentiment, run_id FROM reviews_with_lexicon_sentiment",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(label, "Positive");
        assert_eq!(run, "run-2");
    }
}
