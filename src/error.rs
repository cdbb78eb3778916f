//! Error types for layout compilation, row formatting and storage.
//!
//! ## Error Categories
//!
//! - **Contract violations**: an event stream that does not follow the compiled
//!   column layout ([`Error::EventMismatch`], [`Error::ColumnCount`])
//! - **Formatting overflow**: a sequence length wider than its reserved slot
//! - **Value mismatches**: a sample whose shape does not match its schema
//! - **Configuration**: unsupported output formats and unparsable properties
//! - **I/O Errors**: output files that cannot be opened or written
//!
//! Unknown type kinds found while compiling a layout are *not* errors: they
//! become opaque leaf columns.
//!
//! ## Examples
//!
//! ```rust
//! use flatcsv::Error;
//!
//! let err = Error::length_overflow(1_000, 2);
//! assert!(err.to_string().contains("1000"));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised while converting samples to CSV rows.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error while opening, writing or merging an output target
    #[error("IO error: {0}")]
    Io(String),

    /// A backpatched sequence length does not fit its placeholder
    #[error("Sequence length {count} does not fit in a {width}-character length cell")]
    LengthOverflow { count: usize, width: usize },

    /// The event stream does not correspond to the compiled column layout
    #[error("Event does not match the column layout: {0}")]
    EventMismatch(String),

    /// A finished row does not have the header's number of cells
    #[error("Row has {found} cells but the layout defines {expected} columns")]
    ColumnCount { expected: usize, found: usize },

    /// A sample value does not match its type schema
    #[error("Value mismatch at '{path}': expected {expected}, found {found}")]
    ValueMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// Unsupported type for a stream
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Unsupported output format
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// Configuration property with an invalid value
    #[error("Invalid value '{value}' for property with name={name}: {reason}")]
    InvalidProperty {
        name: String,
        value: String,
        reason: String,
    },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates an I/O error for file opening/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Creates the overflow error raised by the sequence-length patcher.
    pub fn length_overflow(count: usize, width: usize) -> Self {
        Error::LengthOverflow { count, width }
    }

    /// Creates an error for an event stream that left the column layout.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flatcsv::Error;
    ///
    /// let err = Error::event_mismatch("no column named 'z'");
    /// assert!(err.to_string().contains("'z'"));
    /// ```
    pub fn event_mismatch<T: fmt::Display>(msg: T) -> Self {
        Error::EventMismatch(msg.to_string())
    }

    /// Creates a value mismatch error for the member at `path`.
    pub fn value_mismatch(path: &str, expected: &str, found: &str) -> Self {
        Error::ValueMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Creates an unsupported type error.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates an invalid property error.
    pub fn invalid_property(name: &str, value: &str, reason: &str) -> Self {
        Error::InvalidProperty {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
