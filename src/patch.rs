//! In-memory row buffer with sequence-length backpatching.
//!
//! The element count of a sequence is only known once all of its elements have
//! been traversed, yet its `length` cell precedes the elements. The formatter
//! therefore reserves a fixed-width placeholder cell when the sequence begins
//! and patches it in place when the sequence ends. The row is buffered in
//! memory until it is complete, so patching never touches the output target.
//!
//! ```rust
//! use flatcsv::patch::RowBuffer;
//! use flatcsv::LengthFormat;
//!
//! let mut row = RowBuffer::new();
//! let handle = row.reserve(",", "#####");
//! row.push_cell(",", "7");
//! row.patch(handle, 1, LengthFormat::Padded).unwrap();
//! assert_eq!(row.as_str(), ",    1,7");
//! ```

use crate::error::{Error, Result};
use crate::options::LengthFormat;

/// Position and width of a reserved placeholder inside a [`RowBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaceholderHandle {
    offset: usize,
    width: usize,
}

impl PlaceholderHandle {
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }
}

/// Text of the row being formatted, with a count of the cells written so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowBuffer {
    text: String,
    cells: usize,
}

impl RowBuffer {
    #[must_use]
    pub fn new() -> Self {
        RowBuffer {
            text: String::with_capacity(256),
            cells: 0,
        }
    }

    /// Starts a new cell. Its content follows with [`RowBuffer::push_str`].
    pub fn push_separator(&mut self, separator: &str) {
        self.text.push_str(separator);
        self.cells += 1;
    }

    /// Appends text to the current cell.
    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Writes a complete cell.
    pub fn push_cell(&mut self, separator: &str, text: &str) {
        self.push_separator(separator);
        self.push_str(text);
    }

    /// Writes a cell holding `token` and returns a handle to patch it later.
    ///
    /// The width of the placeholder is the length of `token`.
    pub fn reserve(&mut self, separator: &str, token: &str) -> PlaceholderHandle {
        self.push_separator(separator);
        let handle = PlaceholderHandle {
            offset: self.text.len(),
            width: token.len(),
        };
        self.text.push_str(token);
        handle
    }

    /// Overwrites a reserved placeholder with the decimal text of `count`.
    ///
    /// With [`LengthFormat::Padded`] exactly `width` bytes are replaced by the
    /// count right-aligned with leading spaces; no other byte moves. With
    /// [`LengthFormat::Compact`] the placeholder is replaced by the bare count
    /// and everything after it shifts; handles reserved *before* this one stay
    /// valid, handles reserved after it do not.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthOverflow`] if the padded count is wider than the
    /// placeholder.
    pub fn patch(
        &mut self,
        handle: PlaceholderHandle,
        count: usize,
        format: LengthFormat,
    ) -> Result<()> {
        let end = handle.offset + handle.width;
        if end > self.text.len() {
            return Err(Error::custom(format!(
                "placeholder at {}..{} is outside the row buffer of length {}",
                handle.offset,
                end,
                self.text.len()
            )));
        }

        let digits = count.to_string();
        match format {
            LengthFormat::Padded => {
                if digits.len() > handle.width {
                    return Err(Error::length_overflow(count, handle.width));
                }
                let padded = format!("{:>width$}", digits, width = handle.width);
                self.text.replace_range(handle.offset..end, &padded);
            }
            LengthFormat::Compact => {
                self.text.replace_range(handle.offset..end, &digits);
            }
        }
        Ok(())
    }

    /// Number of cells started so far.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cells = 0;
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}
