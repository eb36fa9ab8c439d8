// 📖 Lexicon Sentiment Scorer - rule-based polarity over cleaned review text
//
// Produces the three numbers the lexicon stage stores per review:
//   compound     VADER-style normalized valence sum in [-1, 1]
//   polarity     TextBlob-style mean word polarity in [-1, 1]
//   subjectivity TextBlob-style mean word subjectivity in [0, 1]

use crate::normalizer::CleanedReview;
use crate::sentiment::Sentiment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// VADER normalization constant
const ALPHA: f64 = 15.0;

/// VADER booster increment
const BOOSTER_INCREMENT: f64 = 0.293;

/// VADER negation scalar
const NEGATION_SCALAR: f64 = -0.74;

/// How far back a negation word reaches
const NEGATION_WINDOW: usize = 3;

/// (word, valence on VADER's -4..4 scale, polarity, subjectivity)
const LEXICON: &[(&str, f64, f64, f64)] = &[
    // positive
    ("amazing", 2.8, 0.6, 0.9),
    ("awesome", 3.1, 1.0, 1.0),
    ("beautiful", 2.9, 0.85, 1.0),
    ("best", 3.2, 1.0, 0.3),
    ("brilliant", 2.8, 0.9, 1.0),
    ("clear", 1.6, 0.1, 0.38),
    ("comfortable", 1.8, 0.4, 0.7),
    ("cool", 1.3, 0.35, 0.65),
    ("crisp", 1.1, 0.3, 0.5),
    ("delight", 2.9, 0.8, 0.9),
    ("easy", 1.9, 0.43, 0.83),
    ("enjoy", 2.2, 0.4, 0.5),
    ("excellent", 3.2, 1.0, 1.0),
    ("fantastic", 2.6, 0.4, 0.9),
    ("fun", 2.3, 0.3, 0.2),
    ("good", 1.9, 0.7, 0.6),
    ("great", 3.1, 0.8, 0.75),
    ("happy", 2.7, 0.8, 1.0),
    ("immersive", 1.5, 0.5, 0.6),
    ("impressive", 2.5, 1.0, 1.0),
    ("incredible", 2.4, 0.9, 0.9),
    ("intuitive", 1.6, 0.5, 0.6),
    ("love", 3.2, 0.5, 0.6),
    ("loved", 2.9, 0.7, 0.8),
    ("magical", 2.2, 0.5, 1.0),
    ("nice", 1.8, 0.6, 1.0),
    ("perfect", 2.7, 1.0, 1.0),
    ("recommend", 1.5, 0.3, 0.4),
    ("seamless", 1.6, 0.5, 0.6),
    ("sharp", 0.8, 0.2, 0.5),
    ("smooth", 1.5, 0.4, 0.7),
    ("stunning", 2.7, 0.5, 0.9),
    ("superb", 3.1, 1.0, 1.0),
    ("wonderful", 2.7, 1.0, 1.0),
    ("worth", 0.9, 0.3, 0.1),
    ("wow", 2.8, 0.1, 1.0),
    // negative
    ("annoying", -2.0, -0.8, 0.9),
    ("awful", -2.0, -1.0, 1.0),
    ("bad", -2.5, -0.7, 0.67),
    ("broken", -1.8, -0.4, 0.4),
    ("bulky", -1.0, -0.3, 0.5),
    ("buggy", -1.5, -0.5, 0.6),
    ("cheap", -0.6, 0.4, 0.7),
    ("clunky", -1.3, -0.5, 0.6),
    ("disappointed", -1.9, -0.75, 0.75),
    ("disappointing", -2.2, -0.6, 0.7),
    ("discomfort", -1.5, -0.5, 0.5),
    ("dizzy", -1.2, -0.3, 0.5),
    ("expensive", -0.9, -0.5, 0.7),
    ("fail", -2.5, -0.5, 0.3),
    ("frustrating", -1.9, -0.4, 0.6),
    ("headache", -1.7, -0.4, 0.5),
    ("heavy", -0.9, -0.2, 0.5),
    ("horrible", -2.5, -1.0, 1.0),
    ("issue", -0.8, -0.2, 0.3),
    ("lacking", -1.1, -0.3, 0.4),
    ("limited", -0.9, -0.07, 0.14),
    ("overpriced", -1.6, -0.5, 0.8),
    ("pain", -2.3, -0.6, 0.6),
    ("poor", -2.1, -0.4, 0.6),
    ("problem", -1.7, -0.3, 0.4),
    ("regret", -2.0, -0.6, 0.6),
    ("sad", -2.1, -0.5, 1.0),
    ("terrible", -2.1, -1.0, 1.0),
    ("uncomfortable", -1.6, -0.5, 0.7),
    ("useless", -1.8, -0.5, 0.2),
    ("waste", -1.8, -0.2, 0.3),
    ("worse", -2.1, -0.4, 0.6),
    ("worst", -3.1, -1.0, 1.0),
];

/// Multiplier-style intensifiers (TextBlob) / boosters (VADER)
const INTENSIFIERS: &[(&str, f64)] = &[
    ("absolutely", 1.5),
    ("extremely", 1.5),
    ("incredibly", 1.4),
    ("insanely", 1.5),
    ("really", 1.3),
    ("super", 1.3),
    ("totally", 1.3),
    ("truly", 1.3),
    ("barely", 0.5),
    ("slightly", 0.5),
    ("somewhat", 0.7),
    ("kinda", 0.7),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "nothing", "nowhere", "none", "neither", "nor", "cannot", "cant", "dont",
    "doesnt", "didnt", "isnt", "wasnt", "wont", "wouldnt", "shouldnt", "couldnt", "hardly",
    "without",
];

// ============================================================================
// SCORES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LexiconScores {
    pub compound: f64,
    pub polarity: f64,
    pub subjectivity: f64,
}

/// One stored row of the lexicon stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconSentiment {
    pub review_id: i64,
    pub cleaned_text: String,
    pub vader_compound: f64,
    pub textblob_polarity: f64,
    pub textblob_subjectivity: f64,
    pub final_sentiment: Sentiment,
}

/// Anything that can turn cleaned text into lexicon scores
pub trait SentimentScorer {
    fn score(&self, text: &str) -> LexiconScores;

    /// Score a cleaned review and classify it on the compound score
    fn analyze(&self, review: &CleanedReview) -> LexiconSentiment {
        let scores = self.score(&review.cleaned_text);
        LexiconSentiment {
            review_id: review.review_id,
            cleaned_text: review.cleaned_text.clone(),
            vader_compound: scores.compound,
            textblob_polarity: scores.polarity,
            textblob_subjectivity: scores.subjectivity,
            final_sentiment: Sentiment::from_compound(scores.compound),
        }
    }
}

// ============================================================================
// BUILT-IN LEXICON SCORER
// ============================================================================

struct WordEntry {
    valence: f64,
    polarity: f64,
    subjectivity: f64,
}

pub struct LexiconScorer {
    words: HashMap<String, WordEntry>,
    intensifiers: HashMap<String, f64>,
    negations: Vec<String>,
}

impl LexiconScorer {
    pub fn new() -> Self {
        let words = LEXICON
            .iter()
            .map(|(w, valence, polarity, subjectivity)| {
                (
                    w.to_string(),
                    WordEntry {
                        valence: *valence,
                        polarity: *polarity,
                        subjectivity: *subjectivity,
                    },
                )
            })
            .collect();

        let intensifiers = INTENSIFIERS.iter().map(|(w, m)| (w.to_string(), *m)).collect();
        let negations = NEGATIONS.iter().map(|w| w.to_string()).collect();

        LexiconScorer {
            words,
            intensifiers,
            negations,
        }
    }

    fn is_negated(&self, tokens: &[&str], idx: usize) -> bool {
        let start = idx.saturating_sub(NEGATION_WINDOW);
        tokens[start..idx]
            .iter()
            .any(|t| self.negations.iter().any(|n| n == t))
    }

    fn intensity_before(&self, tokens: &[&str], idx: usize) -> Option<f64> {
        if idx == 0 {
            return None;
        }
        self.intensifiers.get(tokens[idx - 1]).copied()
    }

    /// VADER-style: boost, negate, sum, then normalize into [-1, 1]
    fn compound(&self, tokens: &[&str]) -> f64 {
        let mut sum = 0.0;

        for (i, token) in tokens.iter().enumerate() {
            let entry = match self.words.get(*token) {
                Some(e) => e,
                None => continue,
            };

            let mut valence = entry.valence;

            if let Some(m) = self.intensity_before(tokens, i) {
                let boost = if m >= 1.0 { BOOSTER_INCREMENT } else { -BOOSTER_INCREMENT };
                valence += if valence > 0.0 { boost } else { -boost };
            }

            if self.is_negated(tokens, i) {
                valence *= NEGATION_SCALAR;
            }

            sum += valence;
        }

        if sum == 0.0 {
            return 0.0;
        }

        (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0)
    }

    /// TextBlob-style: mean of (possibly intensified/negated) word polarity and subjectivity
    fn polarity_subjectivity(&self, tokens: &[&str]) -> (f64, f64) {
        let mut polarity_sum = 0.0;
        let mut subjectivity_sum = 0.0;
        let mut matched = 0usize;

        for (i, token) in tokens.iter().enumerate() {
            let entry = match self.words.get(*token) {
                Some(e) => e,
                None => continue,
            };

            let mut polarity = entry.polarity;
            let mut subjectivity = entry.subjectivity;

            if let Some(m) = self.intensity_before(tokens, i) {
                polarity *= m;
                subjectivity *= m;
            }

            if self.is_negated(tokens, i) {
                polarity *= -0.5;
            }

            polarity_sum += polarity;
            subjectivity_sum += subjectivity;
            matched += 1;
        }

        if matched == 0 {
            return (0.0, 0.0);
        }

        let n = matched as f64;
        (
            (polarity_sum / n).clamp(-1.0, 1.0),
            (subjectivity_sum / n).clamp(0.0, 1.0),
        )
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> LexiconScores {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();

        let compound = self.compound(&tokens);
        let (polarity, subjectivity) = self.polarity_subjectivity(&tokens);

        LexiconScores {
            compound,
            polarity,
            subjectivity,
        }
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_text() {
        let scorer = LexiconScorer::new();
        let scores = scorer.score("display amazing immersive love");

        assert!(scores.compound > 0.05);
        assert!(scores.polarity > 0.0);
        assert!(scores.subjectivity > 0.0);
    }

    #[test]
    fn test_negative_text() {
        let scorer = LexiconScorer::new();
        let scores = scorer.score("heavy uncomfortable headache overpriced");

        assert!(scores.compound < -0.05);
        assert!(scores.polarity < 0.0);
    }

    #[test]
    fn test_no_lexicon_words_is_neutral() {
        let scorer = LexiconScorer::new();
        let scores = scorer.score("headset arrived tuesday");

        assert_eq!(scores, LexiconScores::default());
        assert_eq!(Sentiment::from_compound(scores.compound), Sentiment::Neutral);
    }

    #[test]
    fn test_negation_flips_compound() {
        let scorer = LexiconScorer::new();

        let plain = scorer.score("comfortable").compound;
        let negated = scorer.score("never comfortable").compound;

        assert!(plain > 0.0);
        assert!(negated < 0.0);
    }

    #[test]
    fn test_booster_strengthens() {
        let scorer = LexiconScorer::new();

        let plain = scorer.score("good").compound;
        let boosted = scorer.score("extremely good").compound;

        assert!(boosted > plain);
    }

    #[test]
    fn test_scores_stay_in_range() {
        let scorer = LexiconScorer::new();
        let text = "best best best excellent superb awesome perfect love love love";
        let scores = scorer.score(text);

        assert!(scores.compound <= 1.0 && scores.compound > 0.9);
        assert!(scores.polarity <= 1.0);
        assert!(scores.subjectivity <= 1.0);
    }

    #[test]
    fn test_analyze_classifies_review() {
        let scorer = LexiconScorer::new();
        let review = CleanedReview {
            review_id: 7,
            cleaned_text: "terrible battery worst purchase".to_string(),
        };

        let result = scorer.analyze(&review);

        assert_eq!(result.review_id, 7);
        assert_eq!(result.final_sentiment, Sentiment::Negative);
        assert_eq!(result.cleaned_text, review.cleaned_text);
    }
}
