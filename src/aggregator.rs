// 📊 Aspect Aggregator - per-aspect sentiment tallies from model output
//
// Input: one serialized aspect list per review (as stored by the extract stage)
// Output: one AspectAggregate per aspect name with counts and a net score
//
//   net_score    = positive_count - negative_count
//   net_category = sign(net_score)
//   total_count  = positive + negative + neutral + unrecognized
//
// Bad payloads and bad items are skipped and counted, never fatal.

use crate::db::AspectAnalysisRow;
use crate::sentiment::Sentiment;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

// ============================================================================
// NAMING POLICY
// ============================================================================

/// How aspect names are grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectNaming {
    /// Exact, case-sensitive string ("Display" and "display" are different aspects)
    #[default]
    Exact,

    /// Trimmed and case-folded; the first spelling seen is displayed
    Folded,
}

impl AspectNaming {
    fn key(&self, aspect: &str) -> String {
        match self {
            AspectNaming::Exact => aspect.to_string(),
            AspectNaming::Folded => aspect.trim().to_lowercase(),
        }
    }

    fn display(&self, aspect: &str) -> String {
        match self {
            AspectNaming::Exact => aspect.to_string(),
            AspectNaming::Folded => aspect.trim().to_string(),
        }
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// One (aspect, sentiment) mention. The label is kept raw so
/// unrecognized values can still be counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRecord {
    pub review_id: i64,
    pub aspect: String,
    pub label: String,
}

impl AspectRecord {
    pub fn new(review_id: i64, aspect: &str, label: &str) -> Self {
        AspectRecord {
            review_id,
            aspect: aspect.to_string(),
            label: label.to_string(),
        }
    }

    pub fn sentiment(&self) -> Option<Sentiment> {
        Sentiment::parse(&self.label)
    }
}

/// Why a whole payload was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadIssue {
    InvalidJson,
    NotAList,
}

impl PayloadIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadIssue::InvalidJson => "invalid JSON",
            PayloadIssue::NotAList => "not a list",
        }
    }
}

/// Result of parsing one review's payload
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedPayload {
    pub records: Vec<AspectRecord>,
    pub malformed_items: usize,
}

/// Parse one serialized aspect list.
/// The payload must be a JSON array. Items must be objects with a string
/// `aspect` and a `sentiment` key; other items are counted as malformed.
/// A non-string sentiment is kept as its JSON text so it lands in the
/// aspect's total as an unrecognized label.
pub fn parse_payload(review_id: i64, payload: &str) -> Result<ParsedPayload, PayloadIssue> {
    let value: Value = serde_json::from_str(payload).map_err(|_| PayloadIssue::InvalidJson)?;

    let items = match value {
        Value::Array(items) => items,
        _ => return Err(PayloadIssue::NotAList),
    };

    let mut parsed = ParsedPayload::default();

    for item in &items {
        let aspect = item.get("aspect").and_then(Value::as_str);
        let label = item.get("sentiment").map(|v| match v {
            Value::String(label) => label.clone(),
            other => other.to_string(),
        });

        match (aspect, label) {
            (Some(aspect), Some(label)) => {
                parsed.records.push(AspectRecord::new(review_id, aspect, &label));
            }
            _ => parsed.malformed_items += 1,
        }
    }

    Ok(parsed)
}

// ============================================================================
// AGGREGATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectAggregate {
    pub aspect: String,
    pub total_count: usize,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    pub unrecognized_count: usize,
    pub net_score: i64,
    pub net_category: Sentiment,
}

impl AspectAggregate {
    fn empty(aspect: String) -> Self {
        AspectAggregate {
            aspect,
            total_count: 0,
            positive_count: 0,
            negative_count: 0,
            neutral_count: 0,
            unrecognized_count: 0,
            net_score: 0,
            net_category: Sentiment::Neutral,
        }
    }

    fn add(&mut self, sentiment: Option<Sentiment>) {
        self.total_count += 1;
        match sentiment {
            Some(Sentiment::Positive) => self.positive_count += 1,
            Some(Sentiment::Negative) => self.negative_count += 1,
            Some(Sentiment::Neutral) => self.neutral_count += 1,
            None => self.unrecognized_count += 1,
        }
    }

    fn finish(&mut self) {
        self.net_score = self.positive_count as i64 - self.negative_count as i64;
        self.net_category = Sentiment::from_net_score(self.net_score);
    }
}

/// net_score descending, then aspect name ascending
pub fn cmp_by_net_score(a: &AspectAggregate, b: &AspectAggregate) -> Ordering {
    b.net_score
        .cmp(&a.net_score)
        .then_with(|| a.aspect.cmp(&b.aspect))
}

/// total_count descending, then net_score descending, then aspect name ascending
pub fn cmp_by_frequency(a: &AspectAggregate, b: &AspectAggregate) -> Ordering {
    b.total_count
        .cmp(&a.total_count)
        .then_with(|| cmp_by_net_score(a, b))
}

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectSummary {
    /// Aggregates ordered by net score (standout aspects first)
    pub aggregates: Vec<AspectAggregate>,

    /// Payload rows examined
    pub reviews_seen: usize,

    /// Reviews whose payload could not be used at all
    pub skipped_payloads: Vec<(i64, PayloadIssue)>,

    /// Items inside valid lists that lacked a string aspect or any sentiment
    pub malformed_items: usize,

    /// Well-formed records whose label was not Positive/Negative/Neutral
    pub unrecognized_labels: usize,

    /// Well-formed records counted into aggregates
    pub record_count: usize,
}

impl AspectSummary {
    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// Top `n` aspects by mention count
    pub fn top_by_frequency(&self, n: usize) -> Vec<AspectAggregate> {
        let mut rows = self.aggregates.clone();
        rows.sort_by(cmp_by_frequency);
        rows.truncate(n);
        rows
    }

    pub fn summary(&self) -> String {
        format!(
            "{} aspects from {} records in {} reviews | {} payloads skipped, {} malformed items, {} unrecognized labels",
            self.aggregates.len(),
            self.record_count,
            self.reviews_seen,
            self.skipped_payloads.len(),
            self.malformed_items,
            self.unrecognized_labels
        )
    }
}

/// Highest net score; first in slice order on ties
pub fn strongest_positive(rows: &[AspectAggregate]) -> Option<&AspectAggregate> {
    let mut best: Option<&AspectAggregate> = None;
    for row in rows {
        match best {
            Some(b) if row.net_score <= b.net_score => {}
            _ => best = Some(row),
        }
    }
    best
}

/// Lowest net score; first in slice order on ties
pub fn strongest_negative(rows: &[AspectAggregate]) -> Option<&AspectAggregate> {
    let mut worst: Option<&AspectAggregate> = None;
    for row in rows {
        match worst {
            Some(w) if row.net_score >= w.net_score => {}
            _ => worst = Some(row),
        }
    }
    worst
}

// ============================================================================
// AGGREGATOR
// ============================================================================

pub struct AspectAggregator {
    naming: AspectNaming,
}

impl AspectAggregator {
    pub fn new(naming: AspectNaming) -> Self {
        AspectAggregator { naming }
    }

    /// Group records by aspect and tally them. Returned in net-score order.
    pub fn aggregate(&self, records: &[AspectRecord]) -> Vec<AspectAggregate> {
        let mut groups: HashMap<String, AspectAggregate> = HashMap::new();

        for record in records {
            let key = self.naming.key(&record.aspect);
            groups
                .entry(key)
                .or_insert_with(|| AspectAggregate::empty(self.naming.display(&record.aspect)))
                .add(record.sentiment());
        }

        let mut aggregates: Vec<AspectAggregate> = groups
            .into_values()
            .map(|mut agg| {
                agg.finish();
                agg
            })
            .collect();

        aggregates.sort_by(cmp_by_net_score);
        aggregates
    }

    /// Parse every stored row, flatten, aggregate
    pub fn summarize(&self, rows: &[AspectAnalysisRow]) -> AspectSummary {
        let mut records = Vec::new();
        let mut skipped_payloads = Vec::new();
        let mut malformed_items = 0;

        for row in rows {
            match parse_payload(row.review_id, &row.aspect_data_json) {
                Ok(parsed) => {
                    if parsed.malformed_items > 0 {
                        log::debug!(
                            "Review {}: {} malformed aspect items skipped",
                            row.review_id,
                            parsed.malformed_items
                        );
                    }
                    malformed_items += parsed.malformed_items;
                    records.extend(parsed.records);
                }
                Err(issue) => {
                    log::debug!("Review {}: payload skipped ({})", row.review_id, issue.as_str());
                    skipped_payloads.push((row.review_id, issue));
                }
            }
        }

        let unrecognized_labels = records.iter().filter(|r| r.sentiment().is_none()).count();

        AspectSummary {
            aggregates: self.aggregate(&records),
            reviews_seen: rows.len(),
            skipped_payloads,
            malformed_items,
            unrecognized_labels,
            record_count: records.len(),
        }
    }
}

impl Default for AspectAggregator {
    fn default() -> Self {
        Self::new(AspectNaming::Exact)
    }
}

// ============================================================================
// TESTS
// ============================================================================
