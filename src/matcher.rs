// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Decides which words are counted.

use crate::conf::Configuration;
use regex::Regex;
use std::sync::LazyLock;

// Word characters are ASCII only, so "#日本語" is not a hashtag.
static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[0-9A-Za-z_]+").expect("invalid hashtag regex"));

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[0-9A-Za-z_]+").expect("invalid mention regex"));

// A scheme and a colon; everything after the colon is optional.
static URI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[a-z][a-z0-9+.\-]*:\S*").expect("invalid URI regex"));

/// Checks if words should be counted or not.
///
/// A matcher is built from a snapshot of a [`Configuration`] and does not
/// change if the configuration changes later.
#[derive(Debug)]
pub struct WordMatcher {
    rejects: Vec<String>,
    include_hashtags: bool,
    include_uris: bool,
    include_mentions: bool,
}

impl WordMatcher {
    /// Creates a matcher for the settings in `config`.
    pub fn new(config: &Configuration) -> Self {
        Self {
            rejects: config.rejects().to_vec(),
            include_hashtags: config.include_hashtags(),
            include_uris: config.include_uris(),
            include_mentions: config.include_mentions(),
        }
    }

    /// True if `word` should not be counted.
    ///
    /// A word is skipped if it is a reject, or if it is a hashtag, URI, or
    /// @-mention and that kind of word is not being included. Words are
    /// expected to be lowercased already.
    ///
    /// # Examples
    ///
    /// ```
    /// use twords::conf::Configuration;
    /// use twords::matcher::WordMatcher;
    ///
    /// let mut config = Configuration::default();
    /// config.set_rejects(["the"]);
    /// let matcher = WordMatcher::new(&config);
    ///
    /// assert!(matcher.should_be_skipped("the"));
    /// assert!(matcher.should_be_skipped("#caturday"));
    /// assert!(!matcher.should_be_skipped("cat"));
    /// ```
    pub fn should_be_skipped(&self, word: &str) -> bool {
        self.is_reject(word) || self.is_hashtag(word) || self.is_uri(word) || self.is_mention(word)
    }

    /// True if `word` is one of the configured rejects.
    pub fn is_reject(&self, word: &str) -> bool {
        self.rejects.iter().any(|reject| reject == word)
    }

    /// True if hashtags are not included and `word` contains a hashtag.
    pub fn is_hashtag(&self, word: &str) -> bool {
        !self.include_hashtags && HASHTAG_RE.is_match(word)
    }

    /// True if URIs are not included and `word` contains a URI.
    pub fn is_uri(&self, word: &str) -> bool {
        !self.include_uris && URI_RE.is_match(word)
    }

    /// True if @-mentions are not included and `word` contains an @-mention.
    pub fn is_mention(&self, word: &str) -> bool {
        !self.include_mentions && MENTION_RE.is_match(word)
    }
}

/// True if `word` should not be counted under `config`.
///
/// A shortcut for building a [`WordMatcher`] and calling
/// [`WordMatcher::should_be_skipped()`]. When checking many words, build
/// the matcher once instead.
pub fn should_skip(word: &str, config: &Configuration) -> bool {
    WordMatcher::new(config).should_be_skipped(word)
}
