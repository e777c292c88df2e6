//! Run configuration.

use std::path::{Path, PathBuf};

use spate_core::ConfigError;

/// How a batch run should be shaped.
#[derive(Clone, Debug)]
pub struct RunConfig {
    workers: u32,
    output_dir: PathBuf,
}

impl RunConfig {
    /// A run with `workers` worker threads writing artifacts under
    /// `output_dir`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidField`] when `workers` is zero.
    pub fn new(workers: u32, output_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        if workers == 0 {
            return Err(ConfigError::InvalidField {
                field: "workers",
                reason: "a run needs at least one worker".into(),
            });
        }
        Ok(Self {
            workers,
            output_dir: output_dir.into(),
        })
    }

    /// Number of worker threads.
    pub fn workers(&self) -> u32 {
        self.workers
    }

    /// Directory result artifacts are written into.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
