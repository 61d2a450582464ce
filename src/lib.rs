//! # Vigil Crisis Detection Library
//!
//! Core functionality for the vigil service: the multi-model ensemble, the
//! consensus and conflict layers, context analysis over message histories,
//! the operator alerter, and the HTTP surface that binds them together.

pub mod alerts;
pub mod classifiers;
pub mod config;
pub mod context;
pub mod ensemble;
pub mod error;
pub mod explain;
pub mod handlers;
pub mod models;
pub mod secrets;
pub mod server;
pub mod telemetry;
