//! Locating schema files on disk.

use crate::error::{LoadResult, SchemaLoadError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Finds schema files from a source name.
///
/// A source is a path or an `http(s)://` URL. URLs are never fetched: their
/// final path segment is looked up in the search paths instead, so a local
/// copy of `http://schemas.opengis.net/kml/2.2.0/ogckml22.xsd` is found as
/// `ogckml22.xsd`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaResolver {
    search_paths: Vec<PathBuf>,
}

impl SchemaResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    pub fn with_search_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Candidate locations for `source`, in lookup order.
    ///
    /// `relative_to` is the directory of the schema that named `source`.
    pub fn candidates(&self, source: &str, relative_to: Option<&Path>) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        let file_name = if let Some(url) = strip_http(source) {
            url.rsplit('/').find(|segment| !segment.is_empty()).map(PathBuf::from)
        } else {
            let path = Path::new(source);
            if path.is_relative()
                && let Some(dir) = relative_to
            {
                candidates.push(dir.join(path));
            }
            candidates.push(path.to_path_buf());
            path.file_name().map(PathBuf::from)
        };

        if let Some(file_name) = file_name {
            for dir in &self.search_paths {
                let candidate = dir.join(&file_name);
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }
        candidates
    }

    /// The first existing candidate for `source`.
    pub fn resolve(&self, source: &str, relative_to: Option<&Path>) -> LoadResult<PathBuf> {
        let tried = self.candidates(source, relative_to);
        match tried.iter().find(|candidate| candidate.is_file()) {
            Some(found) => {
                debug!(source, path = %found.display(), "resolved schema");
                Ok(found.clone())
            }
            None => Err(SchemaLoadError::NotFound {
                name: source.to_string(),
                tried,
            }),
        }
    }
}

fn strip_http(source: &str) -> Option<&str> {
    source
        .strip_prefix("http://")
        .or_else(|| source.strip_prefix("https://"))
}
