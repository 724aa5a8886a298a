//! Source positions for diagnostics.
//!
//! Parsed documents record byte ranges into the text they came from. A
//! [`SourceContext`] owns the text of every file seen during a run so that
//! diagnostics can be rendered with line/column information and a source
//! snippet.

use serde::{Deserialize, Serialize};

/// A unique identifier for a source file within a [`SourceContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FileId(pub usize);

/// A location in source text (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// Byte offset from start of source
    pub offset: usize,
    /// Row number (0-indexed)
    pub row: usize,
    /// Column number (0-indexed, in characters not bytes)
    pub column: usize,
}

/// A byte range inside one source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceInfo {
    pub file_id: FileId,
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
}

impl SourceInfo {
    pub fn original(file_id: FileId, start: usize, end: usize) -> Self {
        Self {
            file_id,
            start,
            end: end.max(start),
        }
    }

    pub fn start_offset(&self) -> usize {
        self.start
    }

    pub fn end_offset(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Line break index for a file, used to turn offsets into rows and columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInformation {
    /// Byte offset of the first character of every line.
    line_starts: Vec<usize>,
    total_length: usize,
}

impl FileInformation {
    pub fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            content
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            total_length: content.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset into a [`Location`].
    ///
    /// Columns are counted in characters, so the content is needed to walk
    /// the line up to the offset. Offsets past the end clamp to the end.
    pub fn offset_to_location(&self, offset: usize, content: &str) -> Location {
        let offset = offset.min(self.total_length);
        let row = match self.line_starts.binary_search(&offset) {
            Ok(row) => row,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[row];
        let column = content
            .get(line_start..offset)
            .map_or(offset - line_start, |s| s.chars().count());
        Location {
            offset,
            row,
            column,
        }
    }
}

/// A source file with content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// File path, or a placeholder such as `<stdin>`
    pub path: String,
    pub content: String,
    pub file_info: FileInformation,
}

/// Context for managing source files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceContext {
    files: Vec<SourceFile>,
}

impl SourceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the context and return its ID
    pub fn add_file(&mut self, path: impl Into<String>, content: impl Into<String>) -> FileId {
        let id = FileId(self.files.len());
        let content = content.into();
        let file_info = FileInformation::new(&content);
        self.files.push(SourceFile {
            path: path.into(),
            content,
            file_info,
        });
        id
    }

    pub fn get_file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0)
    }

    /// Resolve the start of a [`SourceInfo`] to a row/column location.
    pub fn location_of(&self, info: &SourceInfo) -> Option<Location> {
        let file = self.get_file(info.file_id)?;
        Some(file.file_info.offset_to_location(info.start, &file.content))
    }
}
