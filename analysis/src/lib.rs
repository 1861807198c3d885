//! Per player statistics and a tunable composite rating for recorded matches.
//!
//! Events flow one way: a [`source::TelemetrySource`] feeds the
//! [`aggregate::MetricAggregator`], whose raw metrics are scaled by
//! [`normalize::normalize`], weighted by [`rating::rate`] and placed by
//! [`ranking::rank`]. [`pipeline`] wires the stages together.

pub mod aggregate;
pub mod event;
pub mod normalize;
pub mod perround;
pub mod pipeline;
pub mod ranking;
pub mod rating;
pub mod roundtracker;
pub mod settings;
pub mod source;

pub use settings::Settings;
