//! Context-sensitive dependency configuration for recommender pipelines.
//!
//! A [`Configuration`] collects binding records scoped by context patterns.
//! Resolving it produces a [`ComponentGraph`]: a DAG in which identical
//! shareable components are built once and reused.

pub mod api;
pub mod basic;
pub mod config;
pub mod context;
mod error;
pub mod graph;
pub mod inject;
mod recommender;
pub mod settings;

pub use config::{ConfigContext, Configuration, Module};
pub use error::ConfigurationError;
pub use graph::{ComponentGraph, ResolutionError};
pub use recommender::Recommender;
