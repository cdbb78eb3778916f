//! Per-stream CSV writer.
//!
//! A [`CsvStreamWriter`] owns the compiled [`ColumnTree`] of one stream type
//! and one output target. The header line is written once, when the writer is
//! created; every valid sample then becomes one line: the reception timestamp
//! in integer nanoseconds followed by one cell per leaf column.
//!
//! ```rust
//! use flatcsv::schema::{Member, PrimitiveKind, SequenceType, StructType};
//! use flatcsv::{sample, CsvOptions, CsvStreamWriter, LengthFormat};
//!
//! let ty = StructType::new("S")
//!     .member(Member::new("a", PrimitiveKind::Int32))
//!     .member(Member::optional("b", PrimitiveKind::Int32))
//!     .member(Member::new("c", SequenceType::new(PrimitiveKind::Int32, 3)))
//!     .into();
//! let options = CsvOptions::new().with_length_format(LengthFormat::Compact);
//!
//! let mut writer = CsvStreamWriter::new("Square", ty, options, Vec::new()).unwrap();
//! writer.write_sample(1_000, &sample!({ "a": 5, "c": [7, 9] })).unwrap();
//!
//! let text = String::from_utf8(writer.into_inner()).unwrap();
//! assert_eq!(
//!     text,
//!     "timestamp,.a,.b,.c.length,.c[0],.c[1],.c[2]\n1000,5,nil,2,7,9,nil\n"
//! );
//! ```

use crate::column::ColumnTree;
use crate::cursor::RowFormatter;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::header;
use crate::options::CsvOptions;
use crate::schema::DynamicType;
use crate::traverse::traverse;
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::io::Write;
use tracing::{debug, info};

/// Reception metadata of a sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleInfo {
    pub reception_timestamp: DateTime<Utc>,
    /// Whether the sample carries data. Samples without data are not written.
    pub valid: bool,
}

impl SampleInfo {
    #[must_use]
    pub fn new(reception_timestamp: DateTime<Utc>) -> Self {
        SampleInfo {
            reception_timestamp,
            valid: true,
        }
    }

    /// Metadata of a sample without data, such as a disposal notification.
    #[must_use]
    pub fn invalid(reception_timestamp: DateTime<Utc>) -> Self {
        SampleInfo {
            reception_timestamp,
            valid: false,
        }
    }

    /// Reception time in nanoseconds since the Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns an error for timestamps outside the range of an `i64` count of
    /// nanoseconds (before 1677 or after 2262).
    pub fn timestamp_nanos(&self) -> Result<i64> {
        self.reception_timestamp.timestamp_nanos_opt().ok_or_else(|| {
            Error::custom(format!(
                "reception timestamp {} is out of range",
                self.reception_timestamp
            ))
        })
    }
}

/// A sample as delivered to [`CsvStreamWriter::store`].
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub info: SampleInfo,
    pub data: Value,
}

impl Sample {
    #[must_use]
    pub fn new(info: SampleInfo, data: Value) -> Self {
        Sample { info, data }
    }
}

/// Writes the samples of one stream as CSV rows.
///
/// The writer is not reentrant; distinct writers share nothing and may be used
/// from different threads.
#[derive(Debug)]
pub struct CsvStreamWriter<W: Write> {
    stream_name: String,
    schema: DynamicType,
    tree: ColumnTree,
    options: CsvOptions,
    output: W,
    rows: usize,
}

impl<W: Write> CsvStreamWriter<W> {
    /// Compiles the column layout of `schema` and writes the header line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] if `schema` is not a struct or union,
    /// and [`Error::Io`] if the header cannot be written.
    pub fn new(
        stream_name: impl Into<String>,
        schema: DynamicType,
        options: CsvOptions,
        mut output: W,
    ) -> Result<Self> {
        let stream_name = stream_name.into();
        if !schema.is_aggregate() {
            return Err(Error::unsupported_type(&format!(
                "stream '{}' has type '{}' of kind {}; only structs and unions can be stored",
                stream_name,
                schema.name(),
                schema.kind()
            )));
        }

        let tree = ColumnTree::compile(&schema);
        let mut line = header::render(&tree, options.separator);
        line.push('\n');
        output.write_all(line.as_bytes())?;

        info!(
            stream = %stream_name,
            type_name = schema.name(),
            columns = tree.column_count(),
            "created csv stream writer"
        );
        Ok(CsvStreamWriter {
            stream_name,
            schema,
            tree,
            options,
            output,
            rows: 0,
        })
    }

    #[must_use]
    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    #[must_use]
    pub fn schema(&self) -> &DynamicType {
        &self.schema
    }

    #[must_use]
    pub fn tree(&self) -> &ColumnTree {
        &self.tree
    }

    #[must_use]
    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    /// Number of data rows written so far.
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    /// Writes one row per valid sample and returns the number of rows written.
    ///
    /// Samples are written in order; the first failing sample stops the batch.
    /// Rows already written stay written.
    ///
    /// # Errors
    ///
    /// See [`CsvStreamWriter::write_sample`].
    pub fn store(&mut self, samples: &[Sample]) -> Result<usize> {
        let mut written = 0;
        for sample in samples {
            if !sample.info.valid {
                debug!(stream = %self.stream_name, "skipping sample without data");
                continue;
            }
            let timestamp = sample.info.timestamp_nanos()?;
            self.write_sample(timestamp, &sample.data)?;
            written += 1;
        }
        Ok(written)
    }

    /// Traverses `data` and writes it as one row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueMismatch`] if `data` does not match the stream
    /// type, any error of the row formatter, and [`Error::Io`] if the row
    /// cannot be written. A failed row is never written partially.
    pub fn write_sample(&mut self, timestamp: i64, data: &Value) -> Result<()> {
        let mut formatter = RowFormatter::new(&self.tree, &self.options);
        traverse(&self.schema, data, &self.options, |event| {
            formatter.handle(event)
        })?;
        let row = formatter.finish()?;
        self.write_row(timestamp, &row)
    }

    /// Writes one row from the events of an external traversal.
    ///
    /// # Errors
    ///
    /// See [`RowFormatter::handle`] and [`RowFormatter::finish`].
    pub fn write_events<'e, I>(&mut self, timestamp: i64, events: I) -> Result<()>
    where
        I: IntoIterator<Item = Event<'e>>,
    {
        let row = RowFormatter::format_events(&self.tree, &self.options, events)?;
        self.write_row(timestamp, &row)
    }

    fn write_row(&mut self, timestamp: i64, row: &str) -> Result<()> {
        let mut line = String::with_capacity(row.len() + 21);
        line.push_str(&timestamp.to_string());
        line.push_str(row);
        line.push('\n');
        self.output.write_all(line.as_bytes())?;
        self.rows += 1;
        Ok(())
    }

    /// Flushes the output target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if flushing fails.
    pub fn flush(&mut self) -> Result<()> {
        Ok(self.output.flush()?)
    }

    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.output
    }

    /// Returns the output target, dropping the compiled layout.
    pub fn into_inner(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::LengthFormat;
    use crate::sample;
    use crate::schema::{Member, PrimitiveKind, StructType, UnionCase, UnionType};
    use chrono::TimeZone;

    fn output(writer: CsvStreamWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_union_row() {
        let ty = UnionType::new("U", PrimitiveKind::Int32)
            .case(UnionCase::new("x", PrimitiveKind::Int32, &[1]))
            .case(UnionCase::new("y", PrimitiveKind::Float64, &[2]))
            .into();
        let mut writer = CsvStreamWriter::new("U", ty, CsvOptions::default(), Vec::new()).unwrap();
        writer.write_sample(7, &sample!(union 2 => 3.5)).unwrap();

        assert_eq!(output(writer), "timestamp,.disc,.x,.y\n7,2,nil,3.5\n");
    }

    #[test]
    fn test_store_skips_invalid_samples() {
        let ty = StructType::new("S")
            .member(Member::new("a", PrimitiveKind::Int32))
            .into();
        let options = CsvOptions::new().with_length_format(LengthFormat::Compact);
        let mut writer = CsvStreamWriter::new("S", ty, options, Vec::new()).unwrap();

        let at = Utc.timestamp_opt(1, 500).unwrap();
        let samples = [
            Sample::new(SampleInfo::new(at), sample!({ "a": 1 })),
            Sample::new(SampleInfo::invalid(at), sample!({})),
            Sample::new(SampleInfo::new(at), sample!({ "a": 2 })),
        ];
        assert_eq!(writer.store(&samples).unwrap(), 2);
        assert_eq!(writer.rows_written(), 2);
        assert_eq!(
            output(writer),
            "timestamp,.a\n1000000500,1\n1000000500,2\n"
        );
    }

    #[test]
    fn test_failed_sample_writes_nothing() {
        let ty = StructType::new("S")
            .member(Member::new("a", PrimitiveKind::Int8))
            .into();
        let mut writer = CsvStreamWriter::new("S", ty, CsvOptions::default(), Vec::new()).unwrap();

        assert!(writer.write_sample(1, &sample!({ "a": 300 })).is_err());
        assert_eq!(writer.rows_written(), 0);
        assert_eq!(output(writer), "timestamp,.a\n");
    }

    #[test]
    fn test_primitive_stream_is_unsupported() {
        let ty = DynamicType::Primitive(PrimitiveKind::Int32);
        let err = CsvStreamWriter::new("P", ty, CsvOptions::default(), Vec::new()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
    }

    #[test]
    fn test_write_events() {
        let ty = StructType::new("S")
            .member(Member::optional("a", PrimitiveKind::Int32))
            .into();
        let mut writer = CsvStreamWriter::new("S", ty, CsvOptions::default(), Vec::new()).unwrap();
        writer
            .write_events(
                3,
                [
                    Event::BeginTopLevel,
                    Event::BeginUnsetOptionalMember("a"),
                    Event::EndUnsetOptionalMember("a"),
                    Event::EndTopLevel,
                ],
            )
            .unwrap();
        assert_eq!(output(writer), "timestamp,.a\n3,nil\n");
    }
}
