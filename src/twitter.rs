// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Twitter API services and the tweets they return.

pub mod service;
pub mod tweet;

pub use service::{Service, TwitterService};
pub use tweet::Tweet;
