//! Cursor-driven row formatter.
//!
//! [`RowFormatter`] consumes the traversal [`Event`]s of one sample and writes
//! exactly one cell per leaf column of the compiled [`ColumnTree`], in header
//! order. It keeps a stack of cursors, one per open nesting level; the top
//! cursor always designates the next column expected.
//!
//! Columns a sample does not fill are written as filler cells holding
//! [`CsvOptions::empty_member_value`]:
//!
//! - members skipped while looking up a named member (unset optionals,
//!   untaken union cases before the selected one)
//! - the remaining siblings when a level is left (untaken union cases after
//!   the selected one, sequence slots past the actual length)
//! - every leaf under an unset optional member
//!
//! A skipped struct contributes as many filler cells as it has leaf columns.
//!
//! ```rust
//! use flatcsv::column::ColumnTree;
//! use flatcsv::cursor::RowFormatter;
//! use flatcsv::schema::{Member, PrimitiveKind, StructType};
//! use flatcsv::{CsvOptions, Event};
//!
//! let ty = StructType::new("S")
//!     .member(Member::new("a", PrimitiveKind::Int32))
//!     .member(Member::optional("b", PrimitiveKind::Int32))
//!     .into();
//! let tree = ColumnTree::compile(&ty);
//! let options = CsvOptions::default();
//!
//! let row = RowFormatter::format_events(
//!     &tree,
//!     &options,
//!     [
//!         Event::BeginTopLevel,
//!         Event::BeginPrimitiveType("a"),
//!         Event::Value("5"),
//!         Event::EndPrimitiveType("a"),
//!         Event::BeginUnsetOptionalMember("b"),
//!         Event::EndUnsetOptionalMember("b"),
//!         Event::EndTopLevel,
//!     ],
//! )
//! .unwrap();
//! assert_eq!(row, ",5,nil");
//! ```

use crate::column::{ColumnId, ColumnTree};
use crate::error::{Error, Result};
use crate::event::Event;
use crate::options::{CsvOptions, SEQ_LENGTH_TOKEN};
use crate::patch::{PlaceholderHandle, RowBuffer};
use crate::schema::TypeKind;
use tracing::trace;

/// Position inside the children of `parent`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cursor {
    parent: ColumnId,
    position: usize,
}

/// An open sequence whose length cell is still to be patched.
#[derive(Clone, Debug)]
struct SequenceContext {
    name: String,
    depth: usize,
    length: Option<PlaceholderHandle>,
}

/// Formats one sample into the cells of one row.
///
/// A formatter is created per sample and is not reentrant: events must arrive
/// in traversal order from a single sample.
#[derive(Debug)]
pub struct RowFormatter<'a> {
    tree: &'a ColumnTree,
    options: &'a CsvOptions,
    cursors: Vec<Cursor>,
    sequences: Vec<SequenceContext>,
    row: RowBuffer,
}

impl<'a> RowFormatter<'a> {
    pub fn new(tree: &'a ColumnTree, options: &'a CsvOptions) -> Self {
        RowFormatter {
            tree,
            options,
            cursors: Vec::new(),
            sequences: Vec::new(),
            row: RowBuffer::new(),
        }
    }

    /// Formats a complete event stream and returns the row text.
    ///
    /// # Errors
    ///
    /// See [`RowFormatter::handle`] and [`RowFormatter::finish`].
    pub fn format_events<'e, I>(tree: &ColumnTree, options: &CsvOptions, events: I) -> Result<String>
    where
        I: IntoIterator<Item = Event<'e>>,
    {
        let mut formatter = RowFormatter::new(tree, options);
        for event in events {
            formatter.handle(event)?;
        }
        formatter.finish()
    }

    /// Applies one traversal event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventMismatch`] when the event does not fit the column
    /// layout, and [`Error::LengthOverflow`] when a sequence length does not
    /// fit its cell.
    pub fn handle(&mut self, event: Event<'_>) -> Result<()> {
        trace!(
            %event,
            depth = self.cursors.len(),
            position = ?self.cursors.last().map(|c| c.position),
            "csv cursor"
        );

        match event {
            Event::BeginTopLevel => self.start_data_conversion(),
            Event::EndTopLevel => {
                self.skip_cursor_siblings()?;
                self.pop_cursor()?;
            }
            Event::BeginComplexType(name) => {
                self.skip_cursor_to(name)?;
                self.push_cursor()?;
            }
            Event::EndComplexType(_) | Event::EndComplexItem(_) => self.leave_level()?,
            Event::BeginPrimitiveType(name) => {
                self.skip_cursor_to(name)?;
                self.current_column()?;
                self.row.push_separator(self.options.separator.as_str());
            }
            Event::BeginPrimitiveItem(_) | Event::BeginUnionDiscriminator => {
                self.current_column()?;
                self.row.push_separator(self.options.separator.as_str());
            }
            Event::EndPrimitiveType(_)
            | Event::EndPrimitiveItem(_)
            | Event::EndUnionDiscriminator
            | Event::EndUnsetOptionalMember(_) => self.advance()?,
            Event::BeginArray(name) => self.begin_array(name)?,
            Event::EndArray(name) => {
                self.leave_sequence_context(name)?;
                self.leave_level()?;
            }
            Event::BeginComplexItem(_) => self.push_cursor()?,
            Event::BeginArrayItem(_) | Event::EndArrayItem(_) => {}
            Event::BeginUnsetOptionalMember(name) => {
                self.skip_cursor_to(name)?;
                let column = self.current_column()?;
                self.skip_cursor_columns(column);
            }
            Event::Value(text) => self.row.push_str(text),
        }
        Ok(())
    }

    /// Completes the row and returns its text (without timestamp and newline).
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventMismatch`] if levels or sequence lengths are still
    /// open, and [`Error::ColumnCount`] if the row does not have exactly one
    /// cell per leaf column.
    pub fn finish(self) -> Result<String> {
        if !self.cursors.is_empty() {
            return Err(Error::event_mismatch(format!(
                "sample ended with {} open nesting levels",
                self.cursors.len()
            )));
        }
        if let Some(context) = self.sequences.last() {
            return Err(Error::event_mismatch(format!(
                "length of sequence '{}' was never patched",
                context.name
            )));
        }

        let expected = self.tree.column_count();
        if self.row.cell_count() != expected {
            return Err(Error::ColumnCount {
                expected,
                found: self.row.cell_count(),
            });
        }
        Ok(self.row.into_string())
    }

    /// Resets the state to start converting a new sample.
    fn start_data_conversion(&mut self) {
        self.cursors.clear();
        self.sequences.clear();
        self.row.clear();
        self.cursors.push(Cursor {
            parent: self.tree.root(),
            position: 0,
        });
    }

    fn cursor(&self) -> Result<Cursor> {
        self.cursors
            .last()
            .copied()
            .ok_or_else(|| Error::event_mismatch("no open nesting level"))
    }

    fn cursor_mut(&mut self) -> Result<&mut Cursor> {
        self.cursors
            .last_mut()
            .ok_or_else(|| Error::event_mismatch("no open nesting level"))
    }

    /// Column the top cursor points to.
    fn current_column(&self) -> Result<ColumnId> {
        let cursor = self.cursor()?;
        self.tree
            .children(cursor.parent)
            .get(cursor.position)
            .copied()
            .ok_or_else(|| {
                Error::event_mismatch(format!(
                    "no column left under '{}'",
                    self.tree.node(cursor.parent).name()
                ))
            })
    }

    /// Whether the current level holds the elements of an array or sequence.
    fn in_collection(&self) -> Result<bool> {
        let cursor = self.cursor()?;
        Ok(self.tree.node(cursor.parent).is_collection())
    }

    fn advance(&mut self) -> Result<()> {
        self.cursor_mut()?.position += 1;
        Ok(())
    }

    /// Descends into the children of the current column.
    fn push_cursor(&mut self) -> Result<()> {
        let column = self.current_column()?;
        self.cursors.push(Cursor {
            parent: column,
            position: 0,
        });
        Ok(())
    }

    fn pop_cursor(&mut self) -> Result<Cursor> {
        self.cursors
            .pop()
            .ok_or_else(|| Error::event_mismatch("leaving a level that was never entered"))
    }

    /// Fills the remaining siblings, returns to the parent level and moves
    /// past the column just finished.
    fn leave_level(&mut self) -> Result<()> {
        self.skip_cursor_siblings()?;
        let finished = self.pop_cursor()?;
        if self.tree.node(finished.parent).is_leaf() {
            // an aggregate or collection without columns of its own
            self.skip_cursor_columns(finished.parent);
        }
        self.advance()
    }

    fn begin_array(&mut self, name: &str) -> Result<()> {
        // elements are positional, only named members need a lookup
        if !self.in_collection()? {
            self.skip_cursor_to(name)?;
        }
        let column = self.current_column()?;
        self.push_cursor()?;

        if self.tree.node(column).kind() == TypeKind::Sequence {
            self.enter_sequence_context(name);
            // elements start after the length column
            self.advance()?;
        }
        Ok(())
    }

    /// Writes the length placeholder and opens a sequence context.
    fn enter_sequence_context(&mut self, name: &str) {
        let handle = self
            .row
            .reserve(self.options.separator.as_str(), SEQ_LENGTH_TOKEN);
        self.sequences.push(SequenceContext {
            name: name.to_string(),
            depth: self.cursors.len(),
            length: Some(handle),
        });
    }

    /// Patches the length of the sequence ending at the current level.
    ///
    /// A context that does not match `name` at this depth is left untouched.
    fn leave_sequence_context(&mut self, name: &str) -> Result<()> {
        let depth = self.cursors.len();
        let matches = self
            .sequences
            .last()
            .map_or(false, |c| c.name == name && c.depth == depth);
        if !matches {
            return Ok(());
        }

        let position = self.cursor()?.position;
        if let Some(mut context) = self.sequences.pop() {
            if let Some(handle) = context.length.take() {
                // the cursor rests after the last element received
                let length = position.saturating_sub(1);
                self.row
                    .patch(handle, length, self.options.length_format)?;
            }
        }
        Ok(())
    }

    /// Moves the cursor forward to the member named `name`, filling every
    /// column skipped on the way.
    fn skip_cursor_to(&mut self, name: &str) -> Result<()> {
        let tree = self.tree;
        loop {
            let cursor = self.cursor()?;
            let column = match tree.children(cursor.parent).get(cursor.position) {
                Some(&column) => column,
                None => {
                    return Err(Error::event_mismatch(format!(
                        "no column named '{}' under '{}'",
                        name,
                        self.tree.node(cursor.parent).name()
                    )))
                }
            };
            if self.tree.node(column).name() == name {
                return Ok(());
            }
            self.skip_cursor_columns(column);
            self.advance()?;
        }
    }

    /// Fills every column after the current one at this level.
    fn skip_cursor_siblings(&mut self) -> Result<()> {
        let tree = self.tree;
        let cursor = self.cursor()?;
        let siblings = tree.children(cursor.parent);
        for &column in siblings.iter().skip(cursor.position) {
            self.skip_cursor_columns(column);
        }
        self.cursor_mut()?.position = siblings.len();
        Ok(())
    }

    /// Writes one filler cell per leaf of the subtree rooted at `column`.
    fn skip_cursor_columns(&mut self, column: ColumnId) {
        let tree = self.tree;
        let node = tree.node(column);
        if node.is_leaf() {
            self.row.push_cell(
                self.options.separator.as_str(),
                &self.options.empty_member_value,
            );
            return;
        }
        for &child in node.children() {
            self.skip_cursor_columns(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::LengthFormat;
    use crate::schema::{
        DynamicType, Member, PrimitiveKind, SequenceType, StructType, UnionCase, UnionType,
    };

    fn s_type() -> DynamicType {
        StructType::new("S")
            .member(Member::new("a", PrimitiveKind::Int32))
            .member(Member::optional("b", PrimitiveKind::Int32))
            .member(Member::new("c", SequenceType::new(PrimitiveKind::Int32, 3)))
            .into()
    }

    fn s_events<'e>(b: Option<&'e str>, c: &[&'e str]) -> Vec<Event<'e>> {
        let mut events = vec![
            Event::BeginTopLevel,
            Event::BeginPrimitiveType("a"),
            Event::Value("5"),
            Event::EndPrimitiveType("a"),
        ];
        match b {
            Some(text) => events.extend([
                Event::BeginPrimitiveType("b"),
                Event::Value(text),
                Event::EndPrimitiveType("b"),
            ]),
            None => events.extend([
                Event::BeginUnsetOptionalMember("b"),
                Event::EndUnsetOptionalMember("b"),
            ]),
        }
        events.push(Event::BeginArray("c"));
        for (i, text) in c.iter().enumerate() {
            events.extend([
                Event::BeginPrimitiveItem(i as u32),
                Event::Value(text),
                Event::EndPrimitiveItem(i as u32),
            ]);
        }
        events.extend([Event::EndArray("c"), Event::EndTopLevel]);
        events
    }

    #[test]
    fn test_unset_optional_and_partial_sequence() {
        let tree = ColumnTree::compile(&s_type());
        let options = CsvOptions::new().with_length_format(LengthFormat::Compact);

        let row = RowFormatter::format_events(&tree, &options, s_events(None, &["7", "9"])).unwrap();
        assert_eq!(row, ",5,nil,2,7,9,nil");
    }

    #[test]
    fn test_padded_length() {
        let tree = ColumnTree::compile(&s_type());
        let options = CsvOptions::default();

        let row = RowFormatter::format_events(&tree, &options, s_events(Some("1"), &[])).unwrap();
        assert_eq!(row, ",5,1,              0,nil,nil,nil");
    }

    #[test]
    fn test_union_second_case() {
        let ty = UnionType::new("U", PrimitiveKind::Int32)
            .case(UnionCase::new("x", PrimitiveKind::Int32, &[1]))
            .case(UnionCase::new("y", PrimitiveKind::Float64, &[2]))
            .into();
        let tree = ColumnTree::compile(&ty);
        let options = CsvOptions::default();

        let events = [
            Event::BeginTopLevel,
            Event::BeginUnionDiscriminator,
            Event::Value("2"),
            Event::EndUnionDiscriminator,
            Event::BeginPrimitiveType("y"),
            Event::Value("3.5"),
            Event::EndPrimitiveType("y"),
            Event::EndTopLevel,
        ];
        let row = RowFormatter::format_events(&tree, &options, events).unwrap();
        assert_eq!(row, ",2,nil,3.5");
    }

    #[test]
    fn test_union_first_case_fills_trailing_cases() {
        let ty = UnionType::new("U", PrimitiveKind::Int32)
            .case(UnionCase::new("x", PrimitiveKind::Int32, &[1]))
            .case(UnionCase::new(
                "p",
                StructType::new("P")
                    .member(Member::new("a", PrimitiveKind::Int8))
                    .member(Member::new("b", PrimitiveKind::Int8)),
                &[2],
            ))
            .into();
        let tree = ColumnTree::compile(&ty);
        let options = CsvOptions::new().with_empty_member_value("-");

        let events = [
            Event::BeginTopLevel,
            Event::BeginUnionDiscriminator,
            Event::Value("1"),
            Event::EndUnionDiscriminator,
            Event::BeginPrimitiveType("x"),
            Event::Value("42"),
            Event::EndPrimitiveType("x"),
            Event::EndTopLevel,
        ];
        let row = RowFormatter::format_events(&tree, &options, events).unwrap();
        assert_eq!(row, ",1,42,-,-");
    }

    #[test]
    fn test_unknown_member_is_a_mismatch() {
        let tree = ColumnTree::compile(&s_type());
        let options = CsvOptions::default();

        let mut formatter = RowFormatter::new(&tree, &options);
        formatter.handle(Event::BeginTopLevel).unwrap();
        let err = formatter
            .handle(Event::BeginPrimitiveType("zz"))
            .unwrap_err();
        assert!(matches!(err, Error::EventMismatch(_)));
    }

    #[test]
    fn test_unbalanced_sample_is_rejected() {
        let tree = ColumnTree::compile(&s_type());
        let options = CsvOptions::default();

        let mut events = s_events(None, &["1"]);
        events.pop();
        let err = RowFormatter::format_events(&tree, &options, events).unwrap_err();
        assert!(matches!(err, Error::EventMismatch(_)));
    }

    #[test]
    fn test_leave_without_enter() {
        let tree = ColumnTree::compile(&s_type());
        let options = CsvOptions::default();

        let mut formatter = RowFormatter::new(&tree, &options);
        assert!(formatter.handle(Event::EndTopLevel).is_err());
    }

    #[test]
    fn test_nested_sequences_share_a_name() {
        let inner = SequenceType::new(PrimitiveKind::Int32, 2);
        let ty = StructType::new("S")
            .member(Member::new("m", SequenceType::new(inner, 2)))
            .into();
        let tree = ColumnTree::compile(&ty);
        let options = CsvOptions::new().with_length_format(LengthFormat::Compact);

        let events = [
            Event::BeginTopLevel,
            Event::BeginArray("m"),
            Event::BeginArrayItem(0),
            Event::BeginArray("m"),
            Event::BeginPrimitiveItem(0),
            Event::Value("4"),
            Event::EndPrimitiveItem(0),
            Event::EndArray("m"),
            Event::EndArrayItem(0),
            Event::EndArray("m"),
            Event::EndTopLevel,
        ];
        let row = RowFormatter::format_events(&tree, &options, events).unwrap();
        // m.length, m[0].length, m[0][0], m[0][1], m[1].length, m[1][0], m[1][1]
        assert_eq!(row, ",1,1,4,nil,nil,nil,nil");
    }

    #[test]
    fn test_sequence_end_with_other_name_leaves_length_pending() {
        let tree = ColumnTree::compile(&s_type());
        let options = CsvOptions::default();

        let mut formatter = RowFormatter::new(&tree, &options);
        for event in [Event::BeginTopLevel, Event::BeginArray("c"), Event::EndArray("zz")] {
            formatter.handle(event).unwrap();
        }
        formatter.handle(Event::EndTopLevel).unwrap();

        let err = formatter.finish().unwrap_err();
        assert!(matches!(err, Error::EventMismatch(ref msg) if msg.contains("'c'")));
    }

    #[test]
    fn test_sequence_end_at_other_depth_keeps_outer_length() {
        let item = StructType::new("Item").member(Member::new("v", PrimitiveKind::Int32));
        let ty = StructType::new("S")
            .member(Member::new("m", SequenceType::new(item, 2)))
            .into();
        let tree = ColumnTree::compile(&ty);
        let options = CsvOptions::new().with_length_format(LengthFormat::Compact);

        let events = [
            Event::BeginTopLevel,
            Event::BeginArray("m"),
            Event::BeginComplexItem(0),
            Event::BeginPrimitiveType("v"),
            Event::Value("4"),
            Event::EndPrimitiveType("v"),
            // same name, one level below the sequence
            Event::EndArray("m"),
            Event::EndArray("m"),
            Event::EndTopLevel,
        ];
        let row = RowFormatter::format_events(&tree, &options, events).unwrap();
        assert_eq!(row, ",1,4,nil");
    }
}
