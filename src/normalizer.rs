// 🧹 Text Normalizer - lowercase, strip non-letters, drop stopwords
// Output feeds the lexicon scorer and the negative-theme counter

use regex::Regex;
use std::collections::HashSet;

/// NLTK's English stopword list
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];

/// A review after cleaning
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedReview {
    pub review_id: i64,
    pub cleaned_text: String,
}

pub struct TextNormalizer {
    non_alpha: Regex,
    stopwords: HashSet<String>,
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self::with_stopwords(ENGLISH_STOPWORDS.iter().copied())
    }

    pub fn with_stopwords<'a, I>(stopwords: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        TextNormalizer {
            // Anything that is not an ASCII letter or whitespace
            non_alpha: Regex::new(r"[^a-zA-Z\s]").expect("static regex"),
            stopwords: stopwords.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Lowercase, strip punctuation/digits, drop stopwords, rejoin with single spaces
    pub fn clean(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        let letters_only = self.non_alpha.replace_all(&lower, "");

        letters_only
            .split_whitespace()
            .filter(|w| !self.stopwords.contains(*w))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn clean_review(&self, review_id: i64, text: &str) -> CleanedReview {
        CleanedReview {
            review_id,
            cleaned_text: self.clean(text),
        }
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
