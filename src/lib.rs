//! # flatcsv
//!
//! Flattens samples of nested, self-describing data types into fixed-width CSV
//! rows.
//!
//! The column set of a stream is decided once, from its type schema: every
//! optional member, every union case and every slot of a bounded sequence has
//! its column, whether or not a given sample fills it. Rows therefore always
//! line up with the header, and cells a sample leaves empty hold a filler token
//! (`nil` by default).
//!
//! ## Quick Start
//!
//! ```rust
//! use flatcsv::schema::{Member, PrimitiveKind, SequenceType, StructType};
//! use flatcsv::{header_row, sample, to_row, CsvOptions, LengthFormat};
//!
//! let ty = StructType::new("S")
//!     .member(Member::new("a", PrimitiveKind::Int32))
//!     .member(Member::optional("b", PrimitiveKind::Int32))
//!     .member(Member::new("c", SequenceType::new(PrimitiveKind::Int32, 3)))
//!     .into();
//! let options = CsvOptions::new().with_length_format(LengthFormat::Compact);
//!
//! assert_eq!(header_row(&ty, &options), "timestamp,.a,.b,.c.length,.c[0],.c[1],.c[2]");
//! assert_eq!(
//!     to_row(&ty, &sample!({ "a": 5, "c": [7, 9] }), &options).unwrap(),
//!     ",5,nil,2,7,9,nil"
//! );
//! ```
//!
//! ## How It Works
//!
//! - [`column::ColumnTree::compile`] turns a [`schema::DynamicType`] into a tree
//!   of columns; its leaves are the cells of a row
//! - [`header::render`] names the leaves for the header row
//! - [`traverse::traverse`] walks a [`Value`] and emits [`Event`]s
//! - [`cursor::RowFormatter`] follows the events through the column tree,
//!   writing data cells and filler cells, and backpatches sequence lengths
//!   through [`patch::RowBuffer`]
//!
//! [`CsvStreamWriter`] puts these together for one stream and
//! [`StorageWriter`] manages the output files of a whole recording.
//!
//! ## Sequence Lengths
//!
//! The `length` cell of a sequence is written before its elements, as a
//! placeholder, and patched once the elements have been counted. With the
//! default [`LengthFormat::Padded`] the count is right-aligned in a
//! 15-character cell; [`LengthFormat::Compact`] writes the bare count.
//!
//! ## Logging
//!
//! The crate logs through [`tracing`] and never installs a subscriber.

pub mod column;
pub mod cursor;
pub mod error;
pub mod event;
pub mod header;
pub mod macros;
pub mod map;
pub mod options;
pub mod patch;
pub mod schema;
pub mod storage;
pub mod traverse;
pub mod value;
pub mod writer;

pub use column::{ColumnId, ColumnInfo, ColumnTree};
pub use cursor::RowFormatter;
pub use error::{Error, Result};
pub use event::{Event, OwnedEvent};
pub use map::MemberMap;
pub use options::{CsvOptions, Delimiter, LengthFormat};
pub use schema::DynamicType;
pub use storage::{StorageProperty, StorageWriter};
pub use value::Value;
pub use writer::{CsvStreamWriter, Sample, SampleInfo};

use std::io;

/// Renders the header row of `ty`, without the trailing newline.
///
/// # Examples
///
/// ```rust
/// use flatcsv::schema::{PrimitiveKind, UnionCase, UnionType};
/// use flatcsv::{header_row, CsvOptions};
///
/// let ty = UnionType::new("U", PrimitiveKind::Int32)
///     .case(UnionCase::new("x", PrimitiveKind::Int32, &[1]))
///     .case(UnionCase::new("y", PrimitiveKind::Float64, &[2]))
///     .into();
/// assert_eq!(header_row(&ty, &CsvOptions::default()), "timestamp,.disc,.x,.y");
/// ```
#[must_use]
pub fn header_row(ty: &DynamicType, options: &CsvOptions) -> String {
    header::render(&ColumnTree::compile(ty), options.separator)
}

/// Formats one sample of `ty` into the cells of a row.
///
/// The result starts with the separator of the first cell and has neither
/// timestamp nor trailing newline.
///
/// # Errors
///
/// Returns an error if `value` does not match `ty` or `ty` is not a struct or
/// union.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_row(ty: &DynamicType, value: &Value, options: &CsvOptions) -> Result<String> {
    let tree = ColumnTree::compile(ty);
    let mut formatter = RowFormatter::new(&tree, options);
    traverse::traverse(ty, value, options, |event| formatter.handle(event))?;
    formatter.finish()
}

/// Formats timestamped samples of `ty` as a complete CSV document.
///
/// # Examples
///
/// ```rust
/// use flatcsv::schema::{Member, PrimitiveKind, StructType};
/// use flatcsv::{sample, to_string, CsvOptions};
///
/// let ty = StructType::new("P")
///     .member(Member::new("x", PrimitiveKind::Int16))
///     .into();
/// let text = to_string(&ty, &[(1, sample!({ "x": 3 }))], &CsvOptions::default()).unwrap();
/// assert_eq!(text, "timestamp,.x\n1,3\n");
/// ```
///
/// # Errors
///
/// See [`CsvStreamWriter::write_sample`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string(ty: &DynamicType, samples: &[(i64, Value)], options: &CsvOptions) -> Result<String> {
    let mut buffer = Vec::with_capacity(256);
    to_writer(&mut buffer, ty, samples, options)?;
    String::from_utf8(buffer).map_err(|e| Error::custom(e.to_string()))
}

/// Writes timestamped samples of `ty` as a complete CSV document.
///
/// # Errors
///
/// See [`CsvStreamWriter::write_sample`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W>(
    writer: W,
    ty: &DynamicType,
    samples: &[(i64, Value)],
    options: &CsvOptions,
) -> Result<()>
where
    W: io::Write,
{
    let name = ty.name().to_string();
    let mut stream = CsvStreamWriter::new(name, ty.clone(), options.clone(), writer)?;
    for (timestamp, value) in samples {
        stream.write_sample(*timestamp, value)?;
    }
    stream.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;
    use crate::schema::{Member, PrimitiveKind, SequenceType, StructType};

    #[test]
    fn test_padded_row_by_default() {
        let ty = StructType::new("S")
            .member(Member::new("c", SequenceType::new(PrimitiveKind::Int32, 2)))
            .into();
        let row = to_row(&ty, &sample!({ "c": [1, 2] }), &CsvOptions::default()).unwrap();
        assert_eq!(row, ",              2,1,2");
    }

    #[test]
    fn test_to_writer_tab_separated() {
        let ty = StructType::new("S")
            .member(Member::new("a", PrimitiveKind::Boolean))
            .member(Member::optional("b", PrimitiveKind::Char))
            .into();
        let options = CsvOptions::new().with_separator(Delimiter::Tab);
        let mut buffer = Vec::new();
        to_writer(&mut buffer, &ty, &[(10, sample!({ "a": true }))], &options).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "timestamp\t.a\t.b\n10\ttrue\tnil\n"
        );
    }
}
