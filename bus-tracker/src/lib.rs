//! Bus tracker server.
//!
//! Keeps a cached snapshot of Prague bus positions from the Golemio feed,
//! joins each vehicle with its trip's stop list, and estimates how long a
//! bus needs to reach a given stop on its remaining path.

pub mod buses;
pub mod config;
pub mod domain;
pub mod estimator;
pub mod golemio;
pub mod kv;
pub mod locks;
pub mod positions;
pub mod routing;
pub mod trips;
pub mod web;
