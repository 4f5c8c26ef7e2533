//! Calculator core — zone/card state and point valuation.
//!
//! `valuation` is pure; `store` owns the state; `session` holds the one
//! store instance the worker serves requests against.

pub mod model;
pub mod session;
pub mod store;
pub mod valuation;
