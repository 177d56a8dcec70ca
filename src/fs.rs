//! File-system collaborator.
//!
//! Exposes the input, output, and temporary paths the engine works against.
//! The engine core only checks path collisions and cleans directories; all
//! content I/O belongs to modules.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileSystem {
    input_paths: Vec<PathBuf>,
    output_path: PathBuf,
    temp_path: PathBuf,
}

impl Default for FileSystem {
    fn default() -> Self {
        Self {
            input_paths: vec![PathBuf::from("input")],
            output_path: PathBuf::from("output"),
            temp_path: PathBuf::from("temp"),
        }
    }
}

impl FileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.input_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_temp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_path = path.into();
        self
    }

    /// Input paths compared to the output path by plain equality, without
    /// case or separator normalization.
    pub fn input_paths(&self) -> &[PathBuf] {
        &self.input_paths
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Recursively delete a directory if it exists.
    pub fn clean(&self, path: &Path) -> io::Result<()> {
        if path.exists() {
            fs::remove_dir_all(path)?;
        }
        Ok(())
    }
}
