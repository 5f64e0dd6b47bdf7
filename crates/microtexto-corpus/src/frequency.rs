//! Word-frequency statistics for the exploratory views.
//!
//! Counts are computed over the clean-text column with Spanish stopwords
//! removed, and feed both the top-words chart and the word cloud.

use std::collections::{HashMap, HashSet};

use stop_words::{LANGUAGE, get};

/// Scraper residue that survives preprocessing in tweet text.
const SCRAPER_RESIDUE: &[&str] = &["rt", "https", "http", "co"];

/// Word-frequency counter with stopword filtering.
pub struct Frequencies {
    stopwords: HashSet<String>,
    counts: HashMap<String, usize>,
}

impl Frequencies {
    /// Counter with the Spanish stopword list plus scraper residue.
    pub fn spanish() -> Self {
        let mut stopwords: HashSet<String> = get(LANGUAGE::Spanish).into_iter().collect();
        stopwords.extend(SCRAPER_RESIDUE.iter().map(|w| (*w).to_string()));
        Self {
            stopwords,
            counts: HashMap::new(),
        }
    }

    /// Counter with no stopword filtering.
    pub fn unfiltered() -> Self {
        Self {
            stopwords: HashSet::new(),
            counts: HashMap::new(),
        }
    }

    /// Add extra stopwords.
    pub fn add_stopwords(&mut self, words: &[&str]) {
        self.stopwords.extend(words.iter().map(|w| w.to_lowercase()));
    }

    /// Count the words of one text.
    pub fn add_text(&mut self, text: &str) {
        for word in segment(text) {
            if !self.stopwords.contains(&word) {
                *self.counts.entry(word).or_insert(0) += 1;
            }
        }
    }

    /// Count every text in the iterator.
    pub fn add_all<'a>(&mut self, texts: impl IntoIterator<Item = &'a str>) {
        for text in texts {
            self.add_text(text);
        }
    }

    /// Number of distinct counted words.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Count for a single word (zero if absent or filtered).
    pub fn count(&self, word: &str) -> usize {
        self.counts.get(&word.to_lowercase()).copied().unwrap_or(0)
    }

    /// The `n` most frequent words, count-descending with alphabetical
    /// tiebreak so the charts are deterministic.
    pub fn top(&self, n: usize) -> Vec<(String, usize)> {
        let mut all: Vec<(String, usize)> = self
            .counts
            .iter()
            .map(|(w, &c)| (w.clone(), c))
            .collect();
        all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        all.truncate(n);
        all
    }
}

/// Lowercase word segmentation: alphanumeric runs that contain at least one
/// letter and at least two characters.
fn segment(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2 && w.chars().any(|c| c.is_alphabetic()))
        .map(|w| w.to_lowercase())
}
