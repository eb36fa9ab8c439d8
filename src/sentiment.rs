// 🏷️ Sentiment Labels - the fixed three-way enum shared by every stage
// Lexicon scores, model output and aspect aggregates all speak this vocabulary

use serde::{Deserialize, Serialize};
use std::fmt;

/// Compound scores at or above this are Positive
pub const POSITIVE_THRESHOLD: f64 = 0.05;

/// Compound scores at or below this are Negative
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

// ============================================================================
// SENTIMENT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Report ordering. Never depends on which label is most frequent.
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    /// Parse an exact label ("Positive", "Negative", "Neutral")
    /// Anything else is unrecognized and returns None
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "Positive" => Some(Sentiment::Positive),
            "Negative" => Some(Sentiment::Negative),
            "Neutral" => Some(Sentiment::Neutral),
            _ => None,
        }
    }

    /// Classify a compound polarity score (inclusive at ±0.05)
    pub fn from_compound(score: f64) -> Self {
        if score >= POSITIVE_THRESHOLD {
            Sentiment::Positive
        } else if score <= NEGATIVE_THRESHOLD {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    /// Sign of a net score
    pub fn from_net_score(net: i64) -> Self {
        match net.signum() {
            1 => Sentiment::Positive,
            -1 => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// DISTRIBUTION
// ============================================================================

/// Counts over the fixed enum, plus labels that did not parse
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub unrecognized: usize,
}

impl SentimentDistribution {
    /// Tally raw labels; unknown labels land in `unrecognized`
    pub fn from_labels<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut dist = SentimentDistribution::default();
        for label in labels {
            match Sentiment::parse(label) {
                Some(s) => dist.add(s),
                None => dist.unrecognized += 1,
            }
        }
        dist
    }

    pub fn from_sentiments<I>(sentiments: I) -> Self
    where
        I: IntoIterator<Item = Sentiment>,
    {
        let mut dist = SentimentDistribution::default();
        for s in sentiments {
            dist.add(s);
        }
        dist
    }

    pub fn add(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
        }
    }

    pub fn count(&self, sentiment: Sentiment) -> usize {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
        }
    }

    /// Recognized labels only
    pub fn classified_total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }

    pub fn total(&self) -> usize {
        self.classified_total() + self.unrecognized
    }

    /// Percentage of classified labels, rounded to 2 dp. 0.0 when empty.
    pub fn percentage(&self, sentiment: Sentiment) -> f64 {
        let total = self.classified_total();
        if total == 0 {
            return 0.0;
        }
        let pct = self.count(sentiment) as f64 / total as f64 * 100.0;
        (pct * 100.0).round() / 100.0
    }

    /// Most frequent category, first in fixed order on ties.
    /// None when nothing was classified.
    pub fn dominant(&self) -> Option<(Sentiment, usize)> {
        if self.classified_total() == 0 {
            return None;
        }
        let mut best = (Sentiment::Positive, self.positive);
        for s in [Sentiment::Negative, Sentiment::Neutral] {
            let c = self.count(s);
            if c > best.1 {
                best = (s, c);
            }
        }
        Some(best)
    }
}

// ============================================================================
// TESTS
// ============================================================================
