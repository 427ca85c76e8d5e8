// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document loading for the viewer
//!
//! Plumbing: resolves view-requested paths under the docs root and
//! returns raw MDX content. The orchestration engine never depends on
//! this.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Document shown when the view connects with no navigation history.
pub const DEFAULT_DOCUMENT: &str = "index.mdx";

#[derive(Debug, Error)]
pub enum DocError {
    #[error("invalid document path: {0}")]
    InvalidPath(String),
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Loads documents from a workspace docs directory.
#[derive(Clone)]
pub struct DocLoader {
    docs_root: PathBuf,
}

impl DocLoader {
    pub fn new(docs_root: PathBuf) -> Self {
        Self { docs_root }
    }

    /// Read a document by view-supplied relative path.
    ///
    /// Absolute paths and `..` components are rejected; the view only
    /// ever navigates within the docs root.
    pub fn load(&self, file: &str) -> Result<String, DocError> {
        let relative = Path::new(file);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(DocError::InvalidPath(file.to_string()));
        }

        let path = self.docs_root.join(relative);
        if !path.is_file() {
            return Err(DocError::NotFound(file.to_string()));
        }
        Ok(std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
#[path = "docs_tests.rs"]
mod tests;
