//! Parameter settings loaded from TOML files and the environment.

mod builder;
mod env;
mod error;

pub use builder::{Settings, SettingsBuilder};
pub use error::SettingsError;
