//! File storage for recorded streams.
//!
//! A [`StorageWriter`] creates one CSV file per stream, named
//! `<dir>/<basename>-<stream>.csv`, whose first line names the stream:
//!
//! ```text
//! Topic name: Square
//! timestamp,.a,.b,.c.length,.c[0],.c[1],.c[2]
//! 1000,5,nil,              2,7,9,nil
//! ```
//!
//! With [`StorageProperty::merge_output_files`] set, each stream file is
//! appended to `<dir>/<basename>.csv` when its writer is deleted, and the
//! stream files are removed once the storage writer finishes.
//!
//! ## Properties
//!
//! | Name | Default |
//! |------|---------|
//! | `flatcsv.storage.output_dir_path` | `.` |
//! | `flatcsv.storage.output_file_basename` | `csv_converted` |
//! | `flatcsv.storage.output_format` | `CSV` (the only format) |
//! | `flatcsv.storage.merge_output_files` | `true` |
//! | `flatcsv.storage.csv.empty_member_value` | `nil` |
//! | `flatcsv.storage.csv.enum_as_string` | `true` |
//!
//! ```rust
//! use flatcsv::storage::StorageProperty;
//!
//! let property = StorageProperty::from_properties([
//!     ("flatcsv.storage.output_file_basename", "run1"),
//!     ("flatcsv.storage.merge_output_files", "false"),
//! ])
//! .unwrap();
//! assert!(!property.merge_output_files);
//! assert_eq!(property.stream_file_path("a/b").file_name().unwrap(), "run1-a#b.csv");
//! ```

use crate::error::{Error, Result};
use crate::options::CsvOptions;
use crate::schema::DynamicType;
use crate::writer::{CsvStreamWriter, Sample};
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error, info, warn};

pub const PROPERTY_NAMESPACE: &str = "flatcsv.storage";
pub const OUTPUT_DIR_PROPERTY_NAME: &str = "flatcsv.storage.output_dir_path";
pub const OUTPUT_FILE_BASENAME_PROPERTY_NAME: &str = "flatcsv.storage.output_file_basename";
pub const OUTPUT_FORMAT_PROPERTY_NAME: &str = "flatcsv.storage.output_format";
pub const OUTPUT_MERGE_PROPERTY_NAME: &str = "flatcsv.storage.merge_output_files";
pub const CSV_EMPTY_MEMBER_VALUE_PROPERTY_NAME: &str = "flatcsv.storage.csv.empty_member_value";
pub const CSV_ENUM_AS_STRING_PROPERTY_NAME: &str = "flatcsv.storage.csv.enum_as_string";

pub const CSV_FILE_EXTENSION: &str = ".csv";
pub const OUTPUT_FILE_BASENAME_DEFAULT: &str = "csv_converted";

/// Characters that may not appear in a stream file name.
pub const RESERVED_FILENAME_CHARS: [char; 9] = ['<', '>', ':', '\'', '/', '\\', '|', '?', '*'];
pub const FILE_NAME_REPLACEMENT_CHAR: char = '#';

/// First-line prefix of every stream file.
const TOPIC_NAME_PREFIX: &str = "Topic name: ";

/// Output file format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "CSV")]
    Csv,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CSV" => Ok(OutputFormat::Csv),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => f.write_str("CSV"),
        }
    }
}

/// Configuration of a [`StorageWriter`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageProperty {
    pub output_dir_path: PathBuf,
    pub output_file_basename: String,
    pub output_format: OutputFormat,
    pub merge_output_files: bool,
    pub csv: CsvOptions,
}

impl Default for StorageProperty {
    fn default() -> Self {
        StorageProperty {
            output_dir_path: PathBuf::from("."),
            output_file_basename: OUTPUT_FILE_BASENAME_DEFAULT.to_string(),
            output_format: OutputFormat::default(),
            merge_output_files: true,
            csv: CsvOptions::default(),
        }
    }
}

impl StorageProperty {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_output_dir_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir_path = path.into();
        self
    }

    #[must_use]
    pub fn with_output_file_basename(mut self, basename: impl Into<String>) -> Self {
        self.output_file_basename = basename.into();
        self
    }

    #[must_use]
    pub fn with_merge_output_files(mut self, merge: bool) -> Self {
        self.merge_output_files = merge;
        self
    }

    #[must_use]
    pub fn with_csv_options(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }

    /// Builds a configuration from `name = value` properties.
    ///
    /// Properties outside the `flatcsv.storage` namespace are ignored; unknown
    /// names inside it are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for an output format other than
    /// `CSV` and [`Error::InvalidProperty`] for a boolean property that is
    /// neither `true` nor `false`.
    pub fn from_properties<I, K, V>(properties: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut property = StorageProperty::default();
        for (name, value) in properties {
            let (name, value) = (name.as_ref(), value.as_ref());
            match name {
                OUTPUT_DIR_PROPERTY_NAME => property.output_dir_path = PathBuf::from(value),
                OUTPUT_FILE_BASENAME_PROPERTY_NAME => {
                    property.output_file_basename = value.to_string();
                }
                OUTPUT_FORMAT_PROPERTY_NAME => property.output_format = value.parse()?,
                OUTPUT_MERGE_PROPERTY_NAME => {
                    property.merge_output_files = parse_bool(name, value)?;
                }
                CSV_EMPTY_MEMBER_VALUE_PROPERTY_NAME => {
                    property.csv.empty_member_value = value.to_string();
                }
                CSV_ENUM_AS_STRING_PROPERTY_NAME => {
                    property.csv.enum_as_string = parse_bool(name, value)?;
                }
                other if other.starts_with(PROPERTY_NAMESPACE) => {
                    warn!(property = other, "ignoring unknown storage property");
                }
                _ => {}
            }
        }
        Ok(property)
    }

    /// File name of the stream file, reserved characters replaced.
    #[must_use]
    pub fn stream_file_name(&self, stream_name: &str) -> String {
        let name: String = format!("{}-{}", self.output_file_basename, stream_name)
            .chars()
            .map(|c| {
                if RESERVED_FILENAME_CHARS.contains(&c) {
                    FILE_NAME_REPLACEMENT_CHAR
                } else {
                    c
                }
            })
            .collect();
        name + CSV_FILE_EXTENSION
    }

    #[must_use]
    pub fn stream_file_path(&self, stream_name: &str) -> PathBuf {
        self.output_dir_path.join(self.stream_file_name(stream_name))
    }

    #[must_use]
    pub fn merged_file_path(&self) -> PathBuf {
        self.output_dir_path
            .join(format!("{}{}", self.output_file_basename, CSV_FILE_EXTENSION))
    }
}

impl fmt::Display for StorageProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\toutput_dir_path={}", self.output_dir_path.display())?;
        writeln!(f, "\toutput_file_basename={}", self.output_file_basename)?;
        writeln!(f, "\toutput_format={}", self.output_format)?;
        writeln!(f, "\tmerge_output_files={}", self.merge_output_files)?;
        writeln!(f, "\tcsv.empty_member_value={}", self.csv.empty_member_value)?;
        write!(f, "\tcsv.enum_as_string={}", self.csv.enum_as_string)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::invalid_property(
            name,
            value,
            "valid values are 'true' or 'false'",
        )),
    }
}

fn io_error(context: &str, path: &Path, err: &std::io::Error) -> Error {
    Error::io(&format!("{} file={}: {}", context, path.display(), err))
}

struct StreamEntry {
    path: PathBuf,
    writer: CsvStreamWriter<BufWriter<File>>,
}

/// Creates and manages the output files of a recording.
pub struct StorageWriter {
    property: StorageProperty,
    streams: IndexMap<String, StreamEntry>,
    /// Stream files whose writers were deleted.
    closed_files: Vec<PathBuf>,
    merged: Option<BufWriter<File>>,
    finished: bool,
}

impl StorageWriter {
    /// Creates a storage writer; opens the merged file when merging.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the merged file cannot be created.
    pub fn new(property: StorageProperty) -> Result<Self> {
        let merged = if property.merge_output_files {
            let path = property.merged_file_path();
            let file = File::create(&path)
                .map_err(|e| io_error("failed to open output merged", &path, &e))?;
            Some(BufWriter::new(file))
        } else {
            None
        };

        info!("storage configuration:\n{}", property);
        Ok(StorageWriter {
            property,
            streams: IndexMap::new(),
            closed_files: Vec::new(),
            merged,
            finished: false,
        })
    }

    /// Creates a storage writer from `name = value` properties.
    ///
    /// # Errors
    ///
    /// See [`StorageProperty::from_properties`] and [`StorageWriter::new`].
    pub fn from_properties<I, K, V>(properties: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::new(StorageProperty::from_properties(properties)?)
    }

    #[must_use]
    pub fn property(&self) -> &StorageProperty {
        &self.property
    }

    /// Names of the streams with an open writer, in creation order.
    pub fn stream_names(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }

    /// Creates the file of a stream and its writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream already has a writer, [`Error::Io`] if its
    /// file cannot be created, and any error of [`CsvStreamWriter::new`].
    pub fn create_stream_writer(
        &mut self,
        stream_name: &str,
        schema: DynamicType,
    ) -> Result<&mut CsvStreamWriter<BufWriter<File>>> {
        let entry = match self.streams.entry(stream_name.to_string()) {
            Entry::Occupied(_) => {
                return Err(Error::custom(format!(
                    "stream with name={} already has a writer",
                    stream_name
                )))
            }
            Entry::Vacant(entry) => entry,
        };

        let path = self.property.stream_file_path(stream_name);
        let file = File::create(&path).map_err(|e| {
            io_error(
                &format!("failed to store samples of stream {} in", stream_name),
                &path,
                &e,
            )
        })?;
        let mut output = BufWriter::new(file);
        writeln!(output, "{}{}", TOPIC_NAME_PREFIX, stream_name)
            .map_err(|e| io_error("failed to write", &path, &e))?;

        let writer = CsvStreamWriter::new(stream_name, schema, self.property.csv.clone(), output)?;
        info!(file = %path.display(), "created stream writer");
        Ok(&mut entry.insert(StreamEntry { path, writer }).writer)
    }

    pub fn stream_writer(&mut self, stream_name: &str) -> Option<&mut CsvStreamWriter<BufWriter<File>>> {
        self.streams.get_mut(stream_name).map(|entry| &mut entry.writer)
    }

    /// Stores samples of a stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream has no writer, and any error of
    /// [`CsvStreamWriter::store`].
    pub fn store(&mut self, stream_name: &str, samples: &[Sample]) -> Result<usize> {
        self.stream_writer(stream_name)
            .ok_or_else(|| Error::custom(format!("no writer for stream with name={}", stream_name)))?
            .store(samples)
    }

    /// Closes the file of a stream, appending it to the merged file.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream has no writer and [`Error::Io`] if the
    /// file cannot be flushed or merged.
    pub fn delete_stream_writer(&mut self, stream_name: &str) -> Result<()> {
        let StreamEntry { path, mut writer } = self
            .streams
            .shift_remove(stream_name)
            .ok_or_else(|| Error::custom(format!("no writer for stream with name={}", stream_name)))?;
        info!(file = %path.display(), rows = writer.rows_written(), "deleting stream writer");

        let flushed = writer.flush();
        drop(writer);
        if let Err(err) = flushed {
            self.closed_files.push(path);
            return Err(err);
        }
        let merged = self.merge_output_file(&path);
        self.closed_files.push(path);
        merged
    }

    fn merge_output_file(&mut self, path: &Path) -> Result<()> {
        let merged = match self.merged.as_mut() {
            Some(merged) => merged,
            None => return Ok(()),
        };
        info!(file = %path.display(), "merging stream file");

        let input = File::open(path).map_err(|e| io_error("failed to open", path, &e))?;
        for line in BufReader::new(input).lines() {
            let line = line.map_err(|e| io_error("failed to read", path, &e))?;
            merged
                .write_all(line.as_bytes())
                .and_then(|()| merged.write_all(b"\n"))
                .map_err(|e| Error::io(&format!("failed to write merged file: {}", e)))?;
        }
        Ok(())
    }

    /// Deletes every remaining stream writer and, when merging, removes the
    /// stream files.
    ///
    /// # Errors
    ///
    /// Returns the first error met; the remaining streams are still closed.
    pub fn finish(mut self) -> Result<()> {
        self.finish_streams()
    }

    fn finish_streams(&mut self) -> Result<()> {
        self.finished = true;
        let mut result = Ok(());

        let names: Vec<String> = self.streams.keys().cloned().collect();
        for name in names {
            if let Err(err) = self.delete_stream_writer(&name) {
                error!(stream = %name, error = %err, "failed to close stream file");
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }

        if let Some(mut merged) = self.merged.take() {
            if let Err(err) = merged.flush() {
                error!(error = %err, "failed to flush merged file");
                if result.is_ok() {
                    result = Err(err.into());
                }
            }

            debug!(files = self.closed_files.len(), "deleting output files after merge");
            for path in self.closed_files.drain(..) {
                if let Err(err) = fs::remove_file(&path) {
                    warn!(file = %path.display(), error = %err, "error deleting output file");
                }
            }
        }
        result
    }
}

impl Drop for StorageWriter {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(err) = self.finish_streams() {
                error!(error = %err, "storage writer dropped with errors");
            }
        }
    }
}

impl fmt::Debug for StorageWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageWriter")
            .field("property", &self.property)
            .field("streams", &self.streams.keys().collect::<Vec<_>>())
            .field("merging", &self.merged.is_some())
            .finish()
    }
}
