//! # Vehicle Agent Library
//!
//! Adapts a remote vehicle telematics api to a small vehicle interface:
//! state of charge, range, charge status, start and stop charging.
//!
//! Modules:
//! - `auth`: OAuth2 grants and the authorized http transport
//! - `cache`: single-flight ttl cache over a bulk upstream call
//! - `vehicle`: vehicle trait, capabilities, registry and the Tronity adapter
//! - `config`: service configuration, loading and validation
//! - `controller`: periodic polling of the configured vehicles
//! - `server`: http surface for readings, charge actions and metrics

pub mod auth;
pub mod cache;
pub mod config;
pub mod controller;
pub mod errors;
pub mod helpers;
pub mod observability;
pub mod server;
#[cfg(test)]
mod tests;
pub mod utils;
pub mod vehicle;

pub use crate::config::vehicles::{ServiceConfig, VehicleConfig};
pub use crate::errors::VehicleError;
