use std::error::Error as _;

use crate::graph::ResolutionError;
use crate::settings::SettingsError;
use thiserror::Error;

/// Top-level error for building a recommender from a configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("cannot resolve configuration graph")]
    Resolution(#[from] ResolutionError),

    #[error("invalid settings")]
    Settings(#[from] SettingsError),
}

impl ConfigurationError {
    /// This error and every underlying cause, outermost first.
    pub fn causes(&self) -> Vec<String> {
        let mut causes = vec![self.to_string()];
        let mut source = self.source();
        while let Some(err) = source {
            causes.push(err.to_string());
            source = err.source();
        }
        causes
    }
}
