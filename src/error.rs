use std::fmt;
use std::path::PathBuf;

/// Failures of the URL picker itself. Terminal and config I/O go through
/// `anyhow` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerError {
    /// The backing file does not exist.
    FileNotFound { path: PathBuf },
    /// The backing file exists but could not be read as text.
    Unreadable { path: PathBuf, reason: String },
    /// The backing file is not a list of `(name . url)` pairs.
    MalformedFile {
        path: PathBuf,
        line: usize,
        column: usize,
        reason: String,
    },
    /// An insert command was issued while the cursor addresses no record.
    NoSelectionAtLine { line: usize },
}

impl fmt::Display for PickerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickerError::FileNotFound { path } => {
                write!(f, "URL file not found: {}", path.display())
            }
            PickerError::Unreadable { path, reason } => {
                write!(f, "Failed to read {}: {reason}", path.display())
            }
            PickerError::MalformedFile {
                path,
                line,
                column,
                reason,
            } => write!(
                f,
                "Malformed URL file {}:{line}:{column}: {reason}",
                path.display()
            ),
            PickerError::NoSelectionAtLine { line } => {
                write!(f, "No URL on line {}", line + 1)
            }
        }
    }
}

impl std::error::Error for PickerError {}
