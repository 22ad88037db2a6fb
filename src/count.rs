// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Word frequency counting.

use crate::matcher::WordMatcher;
use crate::twitter::Tweet;
use counter::Counter;
use std::cell::OnceCell;
use std::collections::HashMap;
use thiserror::Error;

/// A pair of word and the number of times it occurs.
pub type WordCount = (String, usize);

/// A pair of word and its share of all counted words, as a percentage.
pub type WordPercentage = (String, f64);

/// Counts how often each word occurs in a set of tweets.
///
/// Views derived from the counts, such as the words sorted by frequency,
/// are computed the first time they are asked for and then cached until
/// the words are counted again or [`WordCounter::invalidate()`] is called.
///
/// Sorted views list the most frequent words first. Words that occur the
/// same number of times are listed in lexicographic order.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use twords::conf::Configuration;
/// use twords::count::WordCounter;
/// use twords::matcher::WordMatcher;
/// use twords::twitter::Tweet;
///
/// let mut config = Configuration::default();
/// config.set_rejects(["the", "a"]);
/// let matcher = WordMatcher::new(&config);
/// let tweets = vec![
///     Tweet::new(2, "the cat sat", Utc::now()),
///     Tweet::new(1, "a dog runs", Utc::now()),
/// ];
///
/// let counter = WordCounter::from_tweets(&tweets, &matcher);
/// assert_eq!(counter.total_word_count(), 4);
/// assert_eq!(counter.percentage("cat").unwrap(), 25.0);
/// ```
#[derive(Debug, Default)]
pub struct WordCounter {
    counts: Counter<String>,
    sorted_words: OnceCell<Vec<WordCount>>,
    total_word_count: OnceCell<usize>,
    percentages: OnceCell<HashMap<String, f64>>,
    sorted_percentages: OnceCell<Vec<WordPercentage>>,
}

impl WordCounter {
    /// Counts the words in `tweets`, skipping any that `matcher` says
    /// should be skipped.
    pub fn from_tweets<'a>(
        tweets: impl IntoIterator<Item = &'a Tweet>,
        matcher: &WordMatcher,
    ) -> Self {
        let mut counter = WordCounter::default();
        counter.count(tweets, matcher);
        counter
    }

    /// Replaces the current counts with a fresh count of the words in
    /// `tweets`.
    ///
    /// Each tweet's text is lowercased and split on whitespace, and every
    /// word `matcher` does not skip is counted. Previous counts are
    /// discarded, not added to.
    pub fn count<'a>(
        &mut self,
        tweets: impl IntoIterator<Item = &'a Tweet>,
        matcher: &WordMatcher,
    ) {
        self.invalidate();
        self.counts = tweets
            .into_iter()
            .flat_map(|tweet| tweet.words())
            .filter(|word| !matcher.should_be_skipped(word))
            .collect::<Counter<_>>();
    }

    /// Discards the counts and all cached views.
    pub fn clear(&mut self) {
        self.counts = Counter::new();
        self.invalidate();
    }

    /// Discards all cached views, leaving the counts alone.
    pub fn invalidate(&mut self) {
        self.sorted_words = OnceCell::new();
        self.total_word_count = OnceCell::new();
        self.percentages = OnceCell::new();
        self.sorted_percentages = OnceCell::new();
    }

    /// Each counted word and the number of times it occurs.
    pub fn words(&self) -> &HashMap<String, usize> {
        &self.counts
    }

    /// Number of times `word` occurs.
    pub fn get(&self, word: &str) -> usize {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// True if no words have been counted.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Words and their counts, sorted from most to least frequent.
    pub fn sort_words(&self) -> &[WordCount] {
        self.sorted_words
            .get_or_init(|| self.counts.most_common_tiebreaker(Ord::cmp))
    }

    /// Total number of words counted, i.e., the sum of every word's count.
    pub fn total_word_count(&self) -> usize {
        *self
            .total_word_count
            .get_or_init(|| self.counts.values().sum())
    }

    /// Each word's share of the [total](Self::total_word_count), as a
    /// percentage.
    ///
    /// Returns [`Error::EmptyCorpus`] if no words have been counted.
    pub fn percentages(&self) -> Result<&HashMap<String, f64>, Error> {
        let total = self.total_word_count();
        if total == 0 {
            return Err(Error::EmptyCorpus);
        }
        Ok(self.percentages.get_or_init(|| {
            self.counts
                .iter()
                .map(|(word, count)| (word.to_string(), percentage(*count, total)))
                .collect()
        }))
    }

    /// The percentage of all counted words that are `word`.
    ///
    /// Words that were never counted have a share of 0.0. Returns
    /// [`Error::EmptyCorpus`] if no words have been counted.
    pub fn percentage(&self, word: &str) -> Result<f64, Error> {
        let percentages = self.percentages()?;
        Ok(percentages.get(word).copied().unwrap_or(0.0))
    }

    /// Words and their percentages, sorted from most to least frequent.
    ///
    /// Returns [`Error::EmptyCorpus`] if no words have been counted.
    pub fn sort_percentages(&self) -> Result<&[WordPercentage], Error> {
        let percentages = self.percentages()?;
        Ok(self.sorted_percentages.get_or_init(|| {
            let mut sorted: Vec<WordPercentage> = percentages
                .iter()
                .map(|(word, pct)| (word.to_string(), *pct))
                .collect();
            sorted.sort_by(|(lhs_word, lhs), (rhs_word, rhs)| {
                rhs.total_cmp(lhs).then_with(|| lhs_word.cmp(rhs_word))
            });
            sorted
        }))
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    count as f64 / total as f64 * 100.0
}

/// A counting error.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// A ratio was requested, but no words were counted.
    #[error("No words have been counted")]
    EmptyCorpus,
}
