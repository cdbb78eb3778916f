//! Header row rendering.
//!
//! Each leaf column is named by the path leading to it: every non-collection
//! node contributes `.` followed by its name, while collection nodes contribute
//! nothing because their children already carry the bracketed element names
//! (`c[0]`) or the synthetic length name (`c.length`).
//!
//! ```rust
//! use flatcsv::column::ColumnTree;
//! use flatcsv::header;
//! use flatcsv::schema::{Member, PrimitiveKind, SequenceType, StructType};
//! use flatcsv::Delimiter;
//!
//! let ty = StructType::new("S")
//!     .member(Member::new("a", PrimitiveKind::Int32))
//!     .member(Member::optional("b", PrimitiveKind::Int32))
//!     .member(Member::new("c", SequenceType::new(PrimitiveKind::Int32, 3)))
//!     .into();
//!
//! let tree = ColumnTree::compile(&ty);
//! assert_eq!(
//!     header::render(&tree, Delimiter::Comma),
//!     "timestamp,.a,.b,.c.length,.c[0],.c[1],.c[2]"
//! );
//! ```

use crate::column::{ColumnId, ColumnTree};
use crate::options::Delimiter;

/// Name of the first column of every row.
pub const TIMESTAMP_COLUMN_NAME: &str = "timestamp";

/// Qualified names of the leaf columns, in the order cells are written.
#[must_use]
pub fn qualified_names(tree: &ColumnTree) -> Vec<String> {
    let mut names = Vec::with_capacity(tree.column_count());
    print_type_header(tree, tree.root(), "", &mut names);
    names
}

/// Renders the header row without the trailing newline.
#[must_use]
pub fn render(tree: &ColumnTree, separator: Delimiter) -> String {
    let mut header = String::from(TIMESTAMP_COLUMN_NAME);
    for name in qualified_names(tree) {
        header.push_str(separator.as_str());
        header.push_str(&name);
    }
    header
}

fn print_type_header(tree: &ColumnTree, current: ColumnId, prefix: &str, names: &mut Vec<String>) {
    for &child in tree.children(current) {
        let info = tree.node(child);
        let mut qualified = prefix.to_string();
        if !info.is_collection() || info.is_leaf() {
            qualified.push('.');
            qualified.push_str(info.name());
        }

        if info.is_leaf() {
            names.push(qualified);
        } else {
            print_type_header(tree, child, &qualified, names);
        }
    }
}
