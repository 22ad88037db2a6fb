// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! All things time-related.

pub use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::ops::Sub;
use std::sync::Arc;

/// Number of seconds in a day, used to express ages in days.
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Tells time and returns the time.
///
/// Generally you will want to retrieve time using [`SystemClock`],
/// but in tests you may want to implement a `Clock` with a fixed time.
pub trait Clock {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Interacts with the system clock to get the current time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A fixed point in time is a clock that never moves.
///
/// This makes it easy to take a single snapshot of a clock and measure
/// many things against it.
impl Clock for DateTime<Utc> {
    fn now(&self) -> DateTime<Utc> {
        *self
    }
}

/// A deferred source of the reference time for an audit.
///
/// The wrapped function is not called when the `UpTo` is created, only
/// when [`Clock::now()`] is invoked, so "now" can be different every time
/// an audit runs. Supplying a function that returns a constant freezes
/// time, which is handy for tests.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use twords::clock::{Clock, UpTo};
///
/// let christmas = Utc.with_ymd_and_hms(2025, 12, 25, 0, 0, 0).unwrap();
/// let up_to = UpTo::new(move || christmas);
/// assert_eq!(up_to.now(), christmas);
/// ```
#[derive(Clone)]
pub struct UpTo(Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>);

impl UpTo {
    /// Creates a new time supplier from a zero-argument function.
    pub fn new(f: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Creates a time supplier that asks `clock` for the time.
    pub fn from_clock<C>(clock: C) -> Self
    where
        C: Clock + Send + Sync + 'static,
    {
        Self::new(move || clock.now())
    }

    /// Creates a time supplier that always returns `datetime`.
    pub fn fixed(datetime: DateTime<Utc>) -> Self {
        Self::from_clock(datetime)
    }
}

impl Default for UpTo {
    /// Uses the system clock, i.e., "up to now".
    fn default() -> Self {
        Self::from_clock(SystemClock)
    }
}

impl Clock for UpTo {
    fn now(&self) -> DateTime<Utc> {
        (self.0)()
    }
}

impl fmt::Debug for UpTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UpTo(<fn>)")
    }
}

/// Marks a thing that has a notion of its age.
pub trait HasAge {
    /// The date the item was created, in UTC.
    fn created_utc(&self) -> DateTime<Utc>;

    /// The age of the item.
    ///
    /// `clock` is a source of time from which the age can be derived.
    /// Items created after the clock's current time have a negative age.
    fn age<C: Clock + ?Sized>(&self, clock: &C) -> TimeDelta {
        clock.now().sub(self.created_utc())
    }

    /// The age of the item in fractional days.
    fn age_in_days<C: Clock + ?Sized>(&self, clock: &C) -> f64 {
        self.age(clock).as_seconds_f64() / SECONDS_PER_DAY
    }
}
