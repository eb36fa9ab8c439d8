// 🔎 Negative Themes - word frequency over cleaned text of negative reviews

use crate::lexicon::LexiconSentiment;
use crate::sentiment::Sentiment;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub word: String,
    pub frequency: usize,
}

/// Most common words across Negative reviews, skipping `filter_words`.
/// Equal frequencies keep first-occurrence order.
pub fn top_negative_themes(
    results: &[LexiconSentiment],
    filter_words: &[String],
    limit: usize,
) -> Vec<Theme> {
    let filter: HashSet<&str> = filter_words.iter().map(|w| w.as_str()).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    let words = results
        .iter()
        .filter(|r| r.final_sentiment == Sentiment::Negative)
        .flat_map(|r| r.cleaned_text.split_whitespace());

    for word in words {
        if filter.contains(word) {
            continue;
        }
        let count = counts.entry(word).or_insert(0);
        if *count == 0 {
            first_seen.push(word);
        }
        *count += 1;
    }

    let mut themes: Vec<Theme> = first_seen
        .into_iter()
        .map(|w| Theme {
            word: w.to_string(),
            frequency: counts[w],
        })
        .collect();

    // Stable sort keeps insertion order among ties
    themes.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    themes.truncate(limit);
    themes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: i64, text: &str, sentiment: Sentiment) -> LexiconSentiment {
        LexiconSentiment {
            review_id: id,
            cleaned_text: text.to_string(),
            vader_compound: 0.0,
            textblob_polarity: 0.0,
            textblob_subjectivity: 0.0,
            final_sentiment: sentiment,
        }
    }

    #[test]
    fn test_only_negative_reviews_counted() {
        let results = vec![
            result(1, "battery heavy", Sentiment::Negative),
            result(2, "battery amazing", Sentiment::Positive),
            result(3, "heavy strap heavy", Sentiment::Negative),
        ];

        let themes = top_negative_themes(&results, &[], 10);

        assert_eq!(themes[0], Theme { word: "heavy".to_string(), frequency: 3 });
        assert_eq!(themes[1], Theme { word: "battery".to_string(), frequency: 1 });
        assert_eq!(themes[2], Theme { word: "strap".to_string(), frequency: 1 });
        assert_eq!(themes.len(), 3);
    }

    #[test]
    fn test_filter_words_and_limit() {
        let results = vec![
            result(1, "headset price price weight apple", Sentiment::Negative),
        ];
        let filter = vec!["headset".to_string(), "apple".to_string()];

        let themes = top_negative_themes(&results, &filter, 1);

        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].word, "price");
    }

    #[test]
    fn test_no_negative_reviews() {
        let results = vec![result(1, "great", Sentiment::Positive)];
        assert!(top_negative_themes(&results, &[], 10).is_empty());
    }
}
