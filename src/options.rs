//! Configuration options for CSV conversion.
//!
//! This module provides types to customize the CSV output:
//!
//! - [`CsvOptions`]: Main configuration struct
//! - [`Delimiter`]: Column separator (comma, tab, pipe or semicolon)
//! - [`LengthFormat`]: How backpatched sequence lengths are rendered
//!
//! ## Examples
//!
//! ```rust
//! use flatcsv::{CsvOptions, Delimiter, LengthFormat};
//!
//! let options = CsvOptions::new()
//!     .with_separator(Delimiter::Semicolon)
//!     .with_empty_member_value("-")
//!     .with_length_format(LengthFormat::Compact);
//! assert_eq!(options.separator.as_str(), ";");
//! ```

use serde::{Deserialize, Serialize};

/// Token written into a reserved sequence-length cell until it is patched.
///
/// Its length is the width of every [`LengthFormat::Padded`] length cell.
pub const SEQ_LENGTH_TOKEN: &str = "###############";

/// Default value written into cells of members absent from a sample.
pub const EMPTY_MEMBER_VALUE_DEFAULT: &str = "nil";

/// Column separator.
///
/// # Examples
///
/// ```rust
/// use flatcsv::Delimiter;
///
/// assert_eq!(Delimiter::Comma.as_str(), ",");
/// assert_eq!(Delimiter::Tab.as_str(), "\t");
/// assert_eq!(Delimiter::Pipe.as_str(), "|");
/// assert_eq!(Delimiter::Semicolon.as_str(), ";");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
    Pipe,
    Semicolon,
}

impl Delimiter {
    /// Returns the string representation of this delimiter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Delimiter::Comma => ",",
            Delimiter::Tab => "\t",
            Delimiter::Pipe => "|",
            Delimiter::Semicolon => ";",
        }
    }
}

/// Rendering of the `length` cell of a bounded sequence.
///
/// The cell is reserved before the elements are traversed and patched once the
/// element count is known.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthFormat {
    /// Right-aligned and left-padded with spaces to the width of
    /// [`SEQ_LENGTH_TOKEN`]. The patch never moves any other byte of the row.
    #[default]
    Padded,
    /// The bare decimal count, e.g. `2`.
    Compact,
}

/// Configuration options for CSV conversion.
///
/// # Examples
///
/// ```rust
/// use flatcsv::CsvOptions;
///
/// let options = CsvOptions::default();
/// assert_eq!(options.empty_member_value, "nil");
/// assert!(options.enum_as_string);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub separator: Delimiter,
    pub empty_member_value: String,
    pub enum_as_string: bool,
    pub length_format: LengthFormat,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            separator: Delimiter::default(),
            empty_member_value: EMPTY_MEMBER_VALUE_DEFAULT.to_string(),
            enum_as_string: true,
            length_format: LengthFormat::default(),
        }
    }
}

impl CsvOptions {
    /// Creates default options (comma separator, `nil` filler, enum labels,
    /// padded length cells).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the column separator.
    #[must_use]
    pub fn with_separator(mut self, separator: Delimiter) -> Self {
        self.separator = separator;
        self
    }

    /// Sets the text written into cells of members absent from a sample.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flatcsv::CsvOptions;
    ///
    /// let options = CsvOptions::new().with_empty_member_value("");
    /// assert!(options.empty_member_value.is_empty());
    /// ```
    #[must_use]
    pub fn with_empty_member_value(mut self, value: impl Into<String>) -> Self {
        self.empty_member_value = value.into();
        self
    }

    /// Selects whether enumerations render their label or their numeric value.
    #[must_use]
    pub fn with_enum_as_string(mut self, enum_as_string: bool) -> Self {
        self.enum_as_string = enum_as_string;
        self
    }

    /// Selects how sequence length cells are rendered.
    #[must_use]
    pub fn with_length_format(mut self, length_format: LengthFormat) -> Self {
        self.length_format = length_format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_options() {
        let options: CsvOptions =
            serde_json::from_str(r#"{"separator":"tab","length_format":"compact"}"#).unwrap();
        assert_eq!(options.separator, Delimiter::Tab);
        assert_eq!(options.length_format, LengthFormat::Compact);
        assert_eq!(options.empty_member_value, "nil");
        assert!(options.enum_as_string);
    }

    #[test]
    fn test_token_width() {
        assert_eq!(SEQ_LENGTH_TOKEN.len(), 15);
        assert!(SEQ_LENGTH_TOKEN.chars().all(|c| c == '#'));
    }
}
