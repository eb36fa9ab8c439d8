// 📝 Report Renderer - fixed four-section console report
//
//   1. Header
//   2. Overall sentiment summary (always Positive, Negative, Neutral)
//   3. Aspect deep dive (top N by mention count)
//   4. Key findings and recommendations (extremes among the displayed rows)

use crate::aggregator::{strongest_negative, strongest_positive, AspectAggregate, AspectSummary};
use crate::db::AspectAnalysisRow;
use crate::sentiment::{Sentiment, SentimentDistribution};
use chrono::{DateTime, Utc};
use std::fmt::Write;

const WIDE_RULE: usize = 80;
const NARROW_RULE: usize = 40;

/// Everything the renderer needs, computed up front
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub product_name: &'a str,
    pub generated_at: DateTime<Utc>,
    pub overall: SentimentDistribution,
    pub aspects: &'a AspectSummary,
    pub top_n: usize,
}

/// Overall sentiment per review, from the stored model rows
pub fn overall_distribution(rows: &[AspectAnalysisRow]) -> SentimentDistribution {
    SentimentDistribution::from_labels(
        rows.iter()
            .map(|r| r.overall_sentiment.as_deref().unwrap_or("")),
    )
}

pub fn render_report(input: &ReportInput) -> String {
    let mut out = String::new();
    write_report(&mut out, input).expect("writing to a String cannot fail");
    out
}

fn write_report(out: &mut String, input: &ReportInput) -> std::fmt::Result {
    let top = input.aspects.top_by_frequency(input.top_n);

    write_header(out, input)?;
    write_overall(out, &input.overall)?;
    write_aspects(out, input.aspects, &top, input.top_n)?;
    write_findings(out, &input.overall, &top)
}

fn write_header(out: &mut String, input: &ReportInput) -> std::fmt::Result {
    let title = format!("{} FEEDBACK ANALYSIS REPORT", input.product_name.to_uppercase());

    writeln!(out, "{}", "=".repeat(WIDE_RULE))?;
    writeln!(out, "{:^width$}", title, width = WIDE_RULE)?;
    writeln!(out, "{}", "=".repeat(WIDE_RULE))?;
    writeln!(out, "Generated: {}", input.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(out, "Total Reviews Analyzed: {}", input.overall.total())?;
    Ok(())
}

fn write_overall(out: &mut String, overall: &SentimentDistribution) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "--- OVERALL SENTIMENT SUMMARY ---")?;
    writeln!(out, "This reflects the high-level, single sentiment assigned to the review as a whole.")?;
    writeln!(out, "{}", "-".repeat(NARROW_RULE))?;

    for sentiment in Sentiment::ALL {
        writeln!(
            out,
            "{:<10} {:>6}  ({:>6.2}%)",
            sentiment.as_str(),
            overall.count(sentiment),
            overall.percentage(sentiment)
        )?;
    }
    if overall.unrecognized > 0 {
        writeln!(out, "{:<10} {:>6}", "Unlabeled", overall.unrecognized)?;
    }

    writeln!(out, "{}", "-".repeat(NARROW_RULE))?;
    Ok(())
}

fn write_aspects(
    out: &mut String,
    summary: &AspectSummary,
    top: &[AspectAggregate],
    top_n: usize,
) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "--- ASPECT-BASED SENTIMENT DEEP DIVE ---")?;
    writeln!(out, "This breaks down sentiment by specific product feature/theme (Aspect).")?;
    writeln!(out, "Net Sentiment Score = (Positive mentions - Negative mentions).")?;
    writeln!(out, "{}", "-".repeat(WIDE_RULE))?;

    if top.is_empty() {
        writeln!(out, "No aspect data available.")?;
    } else {
        let name_width = top
            .iter()
            .map(|a| a.aspect.chars().count())
            .max()
            .unwrap_or(0)
            .max("Aspect".len());

        writeln!(
            out,
            "{:<w$}  {:>5}  {:>5}  {:<8}  {:>4}  {:>4}  {:>4}",
            "Aspect", "Total", "Net", "Category", "Pos", "Neg", "Neu",
            w = name_width
        )?;
        for a in top {
            writeln!(
                out,
                "{:<w$}  {:>5}  {:>5}  {:<8}  {:>4}  {:>4}  {:>4}",
                a.aspect,
                a.total_count,
                a.net_score,
                a.net_category.as_str(),
                a.positive_count,
                a.negative_count,
                a.neutral_count,
                w = name_width
            )?;
        }
        if summary.aggregates.len() > top.len() {
            writeln!(
                out,
                "(showing top {} of {} aspects by mention count)",
                top_n,
                summary.aggregates.len()
            )?;
        }
    }

    writeln!(out, "{}", "-".repeat(WIDE_RULE))?;
    writeln!(
        out,
        "Data quality: {} reviews skipped (unreadable aspect data), {} malformed aspect entries, {} unrecognized aspect labels.",
        summary.skipped_payloads.len(),
        summary.malformed_items,
        summary.unrecognized_labels
    )?;
    Ok(())
}

fn write_findings(
    out: &mut String,
    overall: &SentimentDistribution,
    top: &[AspectAggregate],
) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "--- KEY FINDINGS AND RECOMMENDATIONS ---")?;
    writeln!(out)?;
    writeln!(out, "[KEY FINDINGS]")?;

    let best = strongest_positive(top);
    let worst = strongest_negative(top);

    match (best, worst) {
        (Some(best), Some(worst)) => {
            writeln!(
                out,
                "1. Strongest Positive Feature: '{}' (Net Score: {}). This feature is a major driver of positive sentiment and should be a focus in marketing.",
                best.aspect, best.net_score
            )?;
            writeln!(
                out,
                "2. Strongest Negative Concern: '{}' (Net Score: {}). This represents the most critical area for immediate product improvement.",
                worst.aspect, worst.net_score
            )?;
        }
        _ => {
            writeln!(out, "1. No aspect findings available.")?;
            writeln!(out, "2. No aspect findings available.")?;
        }
    }

    match overall.dominant() {
        Some((sentiment, count)) => writeln!(
            out,
            "3. Overall Brand Perception: {} (Count: {}). The product's overall reception is dominated by {} sentiment.",
            sentiment, count, sentiment
        )?,
        None => writeln!(out, "3. Overall Brand Perception: No reviews analyzed.")?,
    }

    writeln!(out)?;
    writeln!(out, "[RECOMMENDED ACTIONS]")?;
    if let (Some(best), Some(worst)) = (best, worst) {
        writeln!(
            out,
            "* Product Team Priority: Focus R&D on mitigating issues related to {} to reduce churn and negative word-of-mouth.",
            worst.aspect
        )?;
        writeln!(
            out,
            "* Marketing Strategy: Leverage the success of {} by prominently featuring it in advertising and product descriptions.",
            best.aspect
        )?;
    } else {
        writeln!(
            out,
            "* Data Collection: Run the extract stage on more reviews before drawing aspect-level conclusions."
        )?;
    }
    writeln!(
        out,
        "* Content Strategy: Create dedicated customer support content or tutorials to address common 'Neutral' or highly technical aspects to convert indifferent customers into positive advocates."
    )?;

    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(WIDE_RULE))?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::AspectAggregator;

    fn row(id: i64, overall: Option<&str>, payload: &str) -> AspectAnalysisRow {
        AspectAnalysisRow {
            review_id: id,
            overall_sentiment: overall.map(|s| s.to_string()),
            aspect_data_json: payload.to_string(),
        }
    }

    fn render(rows: &[AspectAnalysisRow], top_n: usize) -> String {
        let summary = AspectAggregator::default().summarize(rows);
        let input = ReportInput {
            product_name: "Test Headset",
            generated_at: Utc::now(),
            overall: overall_distribution(rows),
            aspects: &summary,
            top_n,
        };
        render_report(&input)
    }

    #[test]
    fn test_sections_in_order() {
        let rows = vec![
            row(1, Some("Positive"), r#"[{"aspect":"Display","sentiment":"Positive"}]"#),
            row(2, Some("Negative"), r#"[{"aspect":"Price","sentiment":"Negative"}]"#),
        ];

        let report = render(&rows, 10);

        let header = report.find("TEST HEADSET FEEDBACK ANALYSIS REPORT").unwrap();
        let overall = report.find("--- OVERALL SENTIMENT SUMMARY ---").unwrap();
        let aspects = report.find("--- ASPECT-BASED SENTIMENT DEEP DIVE ---").unwrap();
        let findings = report.find("--- KEY FINDINGS AND RECOMMENDATIONS ---").unwrap();

        assert!(header < overall && overall < aspects && aspects < findings);
        assert!(report.contains("Strongest Positive Feature: 'Display' (Net Score: 1)"));
        assert!(report.contains("Strongest Negative Concern: 'Price' (Net Score: -1)"));
        assert!(report.contains("Total Reviews Analyzed: 2"));
    }

    #[test]
    fn test_zero_category_still_listed_in_fixed_order() {
        let rows = vec![
            row(1, Some("Negative"), "[]"),
            row(2, Some("Negative"), "[]"),
            row(3, Some("Positive"), "[]"),
        ];

        let report = render(&rows, 10);

        let pos = report.find("Positive        1").unwrap();
        let neg = report.find("Negative        2").unwrap();
        let neu = report.find("Neutral         0").unwrap();
        assert!(pos < neg && neg < neu);
        assert!(report.contains("Overall Brand Perception: Negative (Count: 2)"));
    }

    #[test]
    fn test_empty_input_reports_no_findings() {
        let report = render(&[], 10);

        assert!(report.contains("No aspect data available."));
        assert!(report.contains("1. No aspect findings available."));
        assert!(report.contains("Overall Brand Perception: No reviews analyzed."));
        assert!(report.contains("Total Reviews Analyzed: 0"));
    }

    #[test]
    fn test_extremes_come_from_displayed_rows_only() {
        // "Rare" has the best net score globally but is not in the top 2 by frequency
        let rows = vec![
            row(1, Some("Positive"), r#"[{"aspect":"Price","sentiment":"Negative"},{"aspect":"Price","sentiment":"Negative"},{"aspect":"Price","sentiment":"Positive"}]"#),
            row(2, Some("Positive"), r#"[{"aspect":"Fit","sentiment":"Neutral"},{"aspect":"Fit","sentiment":"Neutral"}]"#),
            row(3, Some("Positive"), r#"[{"aspect":"Rare","sentiment":"Positive"}]"#),
        ];

        let report = render(&rows, 2);

        assert!(report.contains("Strongest Positive Feature: 'Fit' (Net Score: 0)"));
        assert!(report.contains("Strongest Negative Concern: 'Price' (Net Score: -1)"));
        assert!(report.contains("(showing top 2 of 3 aspects by mention count)"));
    }

    #[test]
    fn test_data_quality_line_and_unlabeled_reviews() {
        let rows = vec![
            row(1, Some("Positive"), r#"[{"aspect":"Audio","sentiment":"Mixed"}]"#),
            row(2, None, "not json"),
        ];

        let report = render(&rows, 10);

        assert!(report.contains("Data quality: 1 reviews skipped (unreadable aspect data), 0 malformed aspect entries, 1 unrecognized aspect labels."));
        assert!(report.contains("Unlabeled"));
        assert!(report.contains("Total Reviews Analyzed: 2"));
    }
}
