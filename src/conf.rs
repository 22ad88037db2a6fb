// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Environment and configuration utilities.
//!
//! A [`Configuration`] holds every setting that affects an audit: which
//! words are rejected outright, whether hashtags, URIs, and @-mentions are
//! counted, how many days of tweets are examined, the point in time the
//! audit is measured up to, and the credentials used to reach Twitter.
//!
//! Audits do not own their configuration. Instead they share a [`Config`]
//! handle, so changing a setting through any clone of the handle affects
//! every audit that has not yet fetched or counted anything.
//!
//! # Examples
//!
//! ```
//! use twords::conf::Config;
//!
//! let config = Config::default();
//! config.configure(|config| {
//!     config
//!         .set_rejects(["the", "for", "and", "a", "i", "of", "if"])
//!         .set_range(14)
//!         .set_include_hashtags(true);
//! });
//! assert_eq!(config.range(), 14);
//! ```

use crate::clock::{Clock, DateTime, UpTo, Utc};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use std::{env, fmt};
use thiserror::Error;

/// Words that are not counted unless the reject list is changed.
pub const DEFAULT_REJECTS: &[&str] = &[
    "my", "us", "we", "an", "w/", "because", "b/c", "or", "are", "this", "is", "from", "be", "on",
    "the", "for", "to", "and", "at", "our", "of", "in", "rt", "a", "with", "&amp;", "that", "it",
    "by", "as", "if", "was",
];

/// Default number of days of tweets to examine.
pub const DEFAULT_RANGE: u32 = 30;

/// Environment variable holding the Twitter API bearer token.
pub const BEARER_TOKEN_VAR: &str = "TWITTER_BEARER_TOKEN";

/// Credentials for the Twitter API.
#[derive(Clone)]
pub struct Credentials {
    bearer_token: Option<String>,
}

impl Credentials {
    /// Credentials with no bearer token.
    pub fn empty() -> Self {
        Self { bearer_token: None }
    }

    /// Reads a bearer token from the environment variable `envvar`.
    ///
    /// If the variable is unset or is not valid Unicode, the credentials
    /// are empty.
    pub fn from_env(envvar: impl AsRef<str>) -> Self {
        let bearer_token = env::var(envvar.as_ref()).ok();
        Self { bearer_token }
    }

    /// The app-only bearer token, if one has been set.
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// Sets the app-only bearer token.
    pub fn set_bearer_token(&mut self, token: impl Into<String>) -> &mut Self {
        self.bearer_token = Some(token.into());
        self
    }
}

impl Default for Credentials {
    /// Reads credentials from `$TWITTER_BEARER_TOKEN`.
    fn default() -> Self {
        Self::from_env(BEARER_TOKEN_VAR)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = self.bearer_token.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("bearer_token", &token)
            .finish()
    }
}

/// Settings for an audit.
#[derive(Clone, Debug)]
pub struct Configuration {
    rejects: Vec<String>,
    include_hashtags: bool,
    include_uris: bool,
    include_mentions: bool,
    range: u32,
    up_to: UpTo,
    credentials: Credentials,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            rejects: DEFAULT_REJECTS.iter().map(|s| s.to_string()).collect(),
            include_hashtags: false,
            include_uris: false,
            include_mentions: false,
            range: DEFAULT_RANGE,
            up_to: UpTo::default(),
            credentials: Credentials::default(),
        }
    }
}

impl Configuration {
    /// Restores every setting to its default value.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    /// Words that are never counted.
    pub fn rejects(&self) -> &[String] {
        &self.rejects
    }

    /// True if hashtags are counted.
    pub fn include_hashtags(&self) -> bool {
        self.include_hashtags
    }

    /// True if URIs are counted.
    pub fn include_uris(&self) -> bool {
        self.include_uris
    }

    /// True if @-mentions are counted.
    pub fn include_mentions(&self) -> bool {
        self.include_mentions
    }

    /// How many days of tweets, counting back from [`up_to`](Self::up_to),
    /// are examined.
    pub fn range(&self) -> u32 {
        self.range
    }

    /// The supplier of the time the audit is measured up to.
    pub fn up_to(&self) -> &UpTo {
        &self.up_to
    }

    /// Calls the [`up_to`](Self::up_to) supplier and returns its time.
    pub fn up_to_time(&self) -> DateTime<Utc> {
        self.up_to.now()
    }

    /// Credentials for the Twitter API.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Replaces the reject list.
    pub fn set_rejects<I, S>(&mut self, rejects: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rejects = rejects.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether hashtags are counted.
    pub fn set_include_hashtags(&mut self, include: bool) -> &mut Self {
        self.include_hashtags = include;
        self
    }

    /// Sets whether URIs are counted.
    pub fn set_include_uris(&mut self, include: bool) -> &mut Self {
        self.include_uris = include;
        self
    }

    /// An alias for [`set_include_uris`](Self::set_include_uris).
    pub fn set_include_urls(&mut self, include: bool) -> &mut Self {
        self.set_include_uris(include)
    }

    /// Sets whether @-mentions are counted.
    pub fn set_include_mentions(&mut self, include: bool) -> &mut Self {
        self.include_mentions = include;
        self
    }

    /// Sets the number of days of tweets to examine.
    pub fn set_range(&mut self, days: u32) -> &mut Self {
        self.range = days;
        self
    }

    /// Sets the function that supplies the time the audit is measured up to.
    ///
    /// `f` is not called now; it is called each time an audit needs to
    /// know what time it is.
    pub fn set_up_to(
        &mut self,
        f: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
    ) -> &mut Self {
        self.up_to = UpTo::new(f);
        self
    }

    /// Measures audits up to the current time of `clock`.
    pub fn set_up_to_clock<C>(&mut self, clock: C) -> &mut Self
    where
        C: Clock + Send + Sync + 'static,
    {
        self.up_to = UpTo::from_clock(clock);
        self
    }

    /// Configures the Twitter API credentials.
    ///
    /// # Examples
    ///
    /// ```
    /// use twords::conf::Configuration;
    ///
    /// let mut config = Configuration::default();
    /// config.twitter_client(|twitter| {
    ///     twitter.set_bearer_token("YOUR_TWITTER_BEARER_TOKEN");
    /// });
    /// assert_eq!(config.credentials().bearer_token(), Some("YOUR_TWITTER_BEARER_TOKEN"));
    /// ```
    pub fn twitter_client(&mut self, f: impl FnOnce(&mut Credentials)) -> &mut Self {
        f(&mut self.credentials);
        self
    }

    /// Sets an option by name from an untyped value.
    ///
    /// Recognized options are `rejects` (a string or an array of strings,
    /// nested arrays are flattened), `include_hashtags`, `include_uris`,
    /// `include_urls`, and `include_mentions` (booleans), `range` (a
    /// non-negative integer), `up_to` (an RFC 3339 timestamp, which freezes
    /// time), and `bearer_token` (a string).
    ///
    /// If the value has the wrong type, [`ConfigError::InvalidArgument`] is
    /// returned and the configuration is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use twords::conf::{ConfigError, Configuration};
    ///
    /// let mut config = Configuration::default();
    /// config.set("include_mentions", true).unwrap();
    /// assert!(config.include_mentions());
    ///
    /// let err = config.set("include_mentions", "yes").unwrap_err();
    /// assert!(matches!(err, ConfigError::InvalidArgument { .. }));
    /// assert!(config.include_mentions());
    /// ```
    pub fn set(&mut self, option: &str, value: impl Into<Value>) -> Result<&mut Self, ConfigError> {
        let value = value.into();
        match option {
            "rejects" => {
                let mut rejects = vec![];
                flatten_rejects(option, &value, &mut rejects)?;
                Ok(self.set_rejects(rejects))
            }
            "include_hashtags" => Ok(self.set_include_hashtags(boolean(option, &value)?)),
            "include_uris" | "include_urls" => Ok(self.set_include_uris(boolean(option, &value)?)),
            "include_mentions" => Ok(self.set_include_mentions(boolean(option, &value)?)),
            "range" => {
                let days = value
                    .as_u64()
                    .and_then(|days| u32::try_from(days).ok())
                    .ok_or_else(|| invalid(option, "a non-negative integer", &value))?;
                Ok(self.set_range(days))
            }
            "up_to" => {
                let datetime = value
                    .as_str()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .ok_or_else(|| invalid(option, "an RFC 3339 timestamp", &value))?
                    .with_timezone(&Utc);
                self.up_to = UpTo::fixed(datetime);
                Ok(self)
            }
            "bearer_token" => {
                let token = value
                    .as_str()
                    .ok_or_else(|| invalid(option, "a string", &value))?;
                self.credentials.set_bearer_token(token);
                Ok(self)
            }
            _ => Err(ConfigError::UnknownOption(option.to_string())),
        }
    }
}

fn boolean(option: &str, value: &Value) -> Result<bool, ConfigError> {
    value
        .as_bool()
        .ok_or_else(|| invalid(option, "a boolean", value))
}

fn flatten_rejects(
    option: &str,
    value: &Value,
    rejects: &mut Vec<String>,
) -> Result<(), ConfigError> {
    match value {
        Value::String(word) => rejects.push(word.to_string()),
        Value::Array(values) => {
            for value in values {
                flatten_rejects(option, value, rejects)?;
            }
        }
        _ => return Err(invalid(option, "a string or an array of strings", value)),
    }
    Ok(())
}

fn invalid(option: &str, expected: &'static str, value: &Value) -> ConfigError {
    ConfigError::InvalidArgument {
        option: option.to_string(),
        expected,
        value: value.clone(),
    }
}

/// A shared handle to a [`Configuration`].
///
/// Cloning the handle does not copy the configuration: all clones see the
/// same settings, and a change made through one clone is visible through
/// the others.
///
/// The handle is safe to send between threads, but it makes no promises
/// about audits that are running while the configuration is being changed;
/// such audits may see the old settings, the new ones, or a mix of both.
#[derive(Clone, Debug, Default)]
pub struct Config {
    inner: Arc<RwLock<Configuration>>,
}

impl Config {
    /// Creates a shared handle to `configuration`.
    pub fn new(configuration: Configuration) -> Self {
        let inner = Arc::new(RwLock::new(configuration));
        Self { inner }
    }

    /// Changes the configuration by calling `f` with a mutable reference
    /// to it, returning whatever `f` returns.
    pub fn configure<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Configuration) -> R,
    {
        let mut configuration = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut configuration)
    }

    /// A copy of the current configuration.
    pub fn snapshot(&self) -> Configuration {
        self.read().clone()
    }

    /// Restores every setting to its default value.
    pub fn reset(&self) {
        self.configure(|configuration| {
            configuration.reset();
        });
    }

    /// The number of days of tweets to examine.
    pub fn range(&self) -> u32 {
        self.read().range()
    }

    /// Calls the configured `up_to` supplier and returns its time.
    pub fn up_to_time(&self) -> DateTime<Utc> {
        // Clone first so the supplier never runs while the lock is held.
        let up_to = self.read().up_to().clone();
        up_to.now()
    }

    fn read(&self) -> RwLockReadGuard<'_, Configuration> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A configuration error.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A value of the wrong type was given for an option.
    #[error("Invalid value for {option}: expected {expected}, got {value}")]
    InvalidArgument {
        /// Name of the option.
        option: String,

        /// Description of the values the option accepts.
        expected: &'static str,

        /// The rejected value.
        value: Value,
    },

    /// The option is not recognized.
    #[error("Unknown configuration option: {0}")]
    UnknownOption(String),
}
