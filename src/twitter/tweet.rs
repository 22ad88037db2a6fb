// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Tweets, as returned by the Twitter API.

use crate::clock::{DateTime, HasAge, Utc};
use serde::Deserialize;
use serde::de::IgnoredAny;
use thiserror::Error;

/// Format of the `created_at` field in Twitter API responses,
/// e.g., `Wed Oct 10 20:19:24 +0000 2018`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// A single tweet.
///
/// Tweets are immutable once they have been fetched.
#[derive(Clone, Debug, PartialEq)]
pub struct Tweet {
    id: u64,
    full_text: String,
    created_at: DateTime<Utc>,
    reply: bool,
    retweet: bool,
}

impl Tweet {
    /// Creates a new tweet that is neither a reply nor a retweet.
    pub fn new(id: u64, full_text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        let full_text = full_text.into();
        Self {
            id,
            full_text,
            created_at,
            reply: false,
            retweet: false,
        }
    }

    /// Parses a page of tweets from a `statuses/user_timeline` JSON response.
    pub fn parse(data: &str) -> Result<Vec<Self>, Error> {
        let raw: Vec<RawTweet> = serde_json::from_str(data)?;
        raw.into_iter().map(Tweet::try_from).collect()
    }

    /// The tweet's ID.
    ///
    /// IDs increase over time, so newer tweets have larger IDs.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The untruncated text of the tweet.
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// When the tweet was posted.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True if the tweet is a reply to another tweet.
    pub fn is_reply(&self) -> bool {
        self.reply
    }

    /// True if the tweet is a retweet.
    pub fn is_retweet(&self) -> bool {
        self.retweet
    }

    /// The tweet's text, lowercased and split on whitespace.
    pub fn words(&self) -> impl Iterator<Item = String> {
        self.full_text.split_whitespace().map(str::to_lowercase)
    }
}

impl HasAge for Tweet {
    fn created_utc(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Deserialize)]
struct RawTweet {
    id: u64,
    full_text: Option<String>,
    text: Option<String>,
    created_at: String,
    in_reply_to_status_id: Option<u64>,
    retweeted_status: Option<IgnoredAny>,
}

impl TryFrom<RawTweet> for Tweet {
    type Error = Error;

    fn try_from(raw: RawTweet) -> Result<Self, Self::Error> {
        let id = raw.id;
        // Without tweet_mode=extended, only the (truncated) "text" is sent.
        let full_text = raw.full_text.or(raw.text).ok_or(Error::MissingText(id))?;
        let created_at = DateTime::parse_from_str(&raw.created_at, CREATED_AT_FORMAT)
            .map_err(|source| Error::Timestamp { id, source })?
            .with_timezone(&Utc);
        Ok(Self {
            id,
            full_text,
            created_at,
            reply: raw.in_reply_to_status_id.is_some(),
            retweet: raw.retweeted_status.is_some(),
        })
    }
}

/// An error parsing tweets.
#[derive(Debug, Error)]
pub enum Error {
    /// The response was not a valid list of tweets.
    #[error("Could not parse tweets: {0}")]
    Json(#[from] serde_json::Error),

    /// A tweet's creation date could not be understood.
    #[error("Invalid creation date for tweet {id}: {source}")]
    Timestamp {
        /// The tweet's ID.
        id: u64,

        /// The underlying parse failure.
        #[source]
        source: chrono::ParseError,
    },

    /// A tweet had neither `full_text` nor `text`.
    #[error("Tweet {0} has no text")]
    MissingText(u64),
}
