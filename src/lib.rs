// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! twords audits the words people use on Twitter. It retrieves the tweets
//! one or more users have posted over a range of days, counts how often
//! each word appears, and reports the counts as rankings, percentages, CSV,
//! or JSON.
//!
//! Words are whatever is separated by whitespace, lowercased. Common filler
//! words are rejected by default, as are hashtags, URIs, and @-mentions;
//! all of these can be changed through the [configuration](conf).
//!
//! # Examples
//!
//! Count the words `jack` has used over the last week, ignoring "the" and
//! "a", and write a CSV report to `twords_report.csv`:
//!
//! ```no_run
//! use twords::Twords;
//! use twords::conf::Config;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! config.configure(|c| {
//!     c.set_rejects(["the", "a"]).set_range(7);
//! });
//!
//! let mut twords = Twords::new(["jack"], config)?;
//! twords.audit().await?;
//!
//! let tweets = twords.tweets_count().await?;
//! println!("{} words in {tweets} tweets", twords.total_word_count());
//! twords.write_to_csv(None)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Twitter API Setup
//!
//! twords reads timelines with an app-only bearer token. Generate one from
//! the [Twitter developer portal] and store it in the `$TWITTER_BEARER_TOKEN`
//! environment variable:
//!
//! ```bash
//! $ export TWITTER_BEARER_TOKEN='copied bearer token'
//! ```
//!
//! Alternatively, supply it in code with
//! [`Configuration::twitter_client()`](conf::Configuration::twitter_client).
//!
//! # License
//!
//! twords is licensed under the terms of the [Apache License 2.0]. Please
//! see the LICENSE file accompanying this source code or visit the previous
//! link for more information on licensing.
//!
//! [Apache License 2.0]: https://www.apache.org/licenses/LICENSE-2.0
//! [Twitter developer portal]: https://developer.twitter.com/en/portal/dashboard

pub mod audit;
pub mod clock;
pub mod conf;
pub mod count;
pub mod http;
pub mod matcher;
pub mod report;
pub mod timeline;
pub mod twitter;

pub use audit::Twords;

#[cfg(test)]
mod test_utils;
