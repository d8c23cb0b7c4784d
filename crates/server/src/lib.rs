//! AQI prediction server
//!
//! HTTP surface over the ensemble predictor: prediction, liveness,
//! readiness and Prometheus metrics.

pub mod api;
pub mod config;
