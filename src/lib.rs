//! Video playback Quality-of-Experience scoring.
//!
//! The core is [`score::compute_total_score`] / [`score::ScoreCalculator`]: a stateless
//! mapping from a [`stats::VideoStats`] snapshot to one number. Everything else
//! (journal, sessions, metrics, web API) is the service wrapped around it.

pub mod config;
pub mod engine;
pub mod journal;
pub mod metrics;
pub mod score;
pub mod sessions;
pub mod stats;
pub mod web;
