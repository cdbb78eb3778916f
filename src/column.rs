//! Column layout compiled from a type schema.
//!
//! The layout is a tree of [`ColumnInfo`] nodes mirroring the nesting of the
//! schema. Every leaf is exactly one CSV cell. The shape of the tree depends on
//! the schema alone: optional members, every union case and every slot of a
//! bounded sequence get their columns whether or not a given sample fills them.
//!
//! Nodes live in an arena owned by [`ColumnTree`] and are addressed with
//! [`ColumnId`]s, so the parent back-reference is a plain index.
//!
//! ## Layout Rules
//!
//! | Type | Children |
//! |------|----------|
//! | primitive, string, enum, opaque | none (leaf) |
//! | alias | those of the aliased type; no extra nesting level |
//! | struct | base members first, then declared members |
//! | union | `disc`, then every case in declaration order |
//! | array | one per element, row-major: `name[i][j]` |
//! | sequence | `name.length`, then `name[0]` .. `name[bound - 1]` |
//!
//! ```rust
//! use flatcsv::column::ColumnTree;
//! use flatcsv::schema::{Member, PrimitiveKind, SequenceType, StructType};
//!
//! let ty = StructType::new("S")
//!     .member(Member::new("a", PrimitiveKind::Int32))
//!     .member(Member::new("c", SequenceType::new(PrimitiveKind::Int32, 3)))
//!     .into();
//!
//! let tree = ColumnTree::compile(&ty);
//! assert_eq!(tree.column_count(), 5);
//! ```

use crate::schema::{ArrayType, DynamicType, PrimitiveKind, SequenceType, TypeKind, UnionType};
use std::fmt;
use tracing::debug;

/// Name of the synthetic union discriminator column.
///
/// The column is named `disc` rather than `<union type>.disc`, so a union
/// root renders as `.disc` in the header, next to its case columns.
pub const DISCRIMINATOR_COLUMN_NAME: &str = "disc";

/// Suffix of the synthetic sequence length column.
pub const LENGTH_COLUMN_SUFFIX: &str = ".length";

/// Index of a node inside its [`ColumnTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(usize);

impl ColumnId {
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

/// Information associated with one column node.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnInfo {
    name: String,
    kind: TypeKind,
    parent: Option<ColumnId>,
    children: Vec<ColumnId>,
}

impl ColumnInfo {
    fn new(name: String, kind: TypeKind, parent: Option<ColumnId>) -> Self {
        ColumnInfo {
            name,
            kind,
            parent,
            children: Vec::new(),
        }
    }

    /// Member name, element name (`c[0]`) or synthetic name (`disc`, `c.length`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of the member this column represents, with aliases resolved.
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[must_use]
    pub fn parent(&self) -> Option<ColumnId> {
        self.parent
    }

    #[must_use]
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    #[must_use]
    pub fn children(&self) -> &[ColumnId] {
        &self.children
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.kind.is_collection()
    }
}

impl fmt::Display for ColumnInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name: {}, kind: {}, parent: {:?}, children: {}",
            self.name,
            self.kind,
            self.parent.map(|p| p.0),
            self.children.len()
        )
    }
}

/// Immutable column layout for one stream type.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnTree {
    nodes: Vec<ColumnInfo>,
}

impl ColumnTree {
    /// Compiles the column layout of `ty`.
    ///
    /// Compilation is a pure function of the schema: compiling the same type
    /// twice yields equal trees.
    #[must_use]
    pub fn compile(ty: &DynamicType) -> Self {
        let mut tree = ColumnTree {
            nodes: vec![ColumnInfo::new(String::new(), ty.kind(), None)],
        };
        let root = tree.root();
        tree.build_column_info(root, ty);

        debug!(
            type_name = ty.name(),
            columns = tree.column_count(),
            nodes = tree.nodes.len(),
            "compiled column layout"
        );
        tree
    }

    #[must_use]
    pub fn root(&self) -> ColumnId {
        ColumnId(0)
    }

    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    #[must_use]
    pub fn node(&self, id: ColumnId) -> &ColumnInfo {
        &self.nodes[id.0]
    }

    #[must_use]
    pub fn children(&self, id: ColumnId) -> &[ColumnId] {
        &self.nodes[id.0].children
    }

    #[must_use]
    pub fn parent(&self, id: ColumnId) -> Option<ColumnId> {
        self.nodes[id.0].parent
    }

    /// Number of cells the subtree rooted at `id` occupies in a row.
    #[must_use]
    pub fn leaf_count(&self, id: ColumnId) -> usize {
        let node = self.node(id);
        if node.is_leaf() {
            1
        } else {
            node.children.iter().map(|&c| self.leaf_count(c)).sum()
        }
    }

    /// Number of data columns of a row, excluding the timestamp column.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.children(self.root())
            .iter()
            .map(|&c| self.leaf_count(c))
            .sum()
    }

    /// Leaf columns in row order.
    #[must_use]
    pub fn leaves(&self) -> Vec<ColumnId> {
        let mut leaves = Vec::with_capacity(self.nodes.len());
        for &child in self.children(self.root()) {
            self.collect_leaves(child, &mut leaves);
        }
        leaves
    }

    fn collect_leaves(&self, id: ColumnId, leaves: &mut Vec<ColumnId>) {
        let node = self.node(id);
        if node.is_leaf() {
            leaves.push(id);
        }
        for &child in &node.children {
            self.collect_leaves(child, leaves);
        }
    }

    fn add_child(&mut self, parent: ColumnId, name: String, ty: &DynamicType) -> ColumnId {
        let id = ColumnId(self.nodes.len());
        self.nodes.push(ColumnInfo::new(name, ty.kind(), Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    fn build_column_info(&mut self, current: ColumnId, ty: &DynamicType) {
        match ty {
            DynamicType::Struct(struct_type) => {
                // base members are laid out in place, ahead of the declared ones
                for member in struct_type.all_members() {
                    let child = self.add_child(current, member.name.clone(), &member.ty);
                    self.build_column_info(child, &member.ty);
                }
            }
            DynamicType::Union(union_type) => self.build_union(current, union_type),
            DynamicType::Array(array_type) => self.build_array(current, array_type),
            DynamicType::Sequence(sequence_type) => self.build_sequence(current, sequence_type),
            DynamicType::Alias(alias_type) => {
                let related = alias_type.related_type();
                self.nodes[current.0].kind = related.kind();
                self.build_column_info(current, related);
            }
            // leaf reached
            _ => {}
        }
    }

    fn build_union(&mut self, current: ColumnId, union_type: &UnionType) {
        let discriminator = union_type.discriminator();
        let disc = self.add_child(current, DISCRIMINATOR_COLUMN_NAME.to_string(), discriminator);
        self.build_column_info(disc, discriminator);

        for case in union_type.cases() {
            let child = self.add_child(current, case.name.clone(), &case.ty);
            self.build_column_info(child, &case.ty);
        }
    }

    fn build_array(&mut self, current: ColumnId, array_type: &ArrayType) {
        let dimensions = array_type.dimensions();
        let element = array_type.content_type();
        let mut indexes = vec![0u32; dimensions.len()];

        for _ in 0..array_type.total_element_count() {
            let mut name = self.nodes[current.0].name.clone();
            for index in &indexes {
                name.push_str(&format!("[{}]", index));
            }
            let child = self.add_child(current, name, element);
            self.build_column_info(child, element);

            // multi-radix increment, last dimension fastest
            for dim in (0..indexes.len()).rev() {
                indexes[dim] += 1;
                if indexes[dim] < dimensions[dim] || dim == 0 {
                    break;
                }
                indexes[dim] = 0;
            }
        }
    }

    fn build_sequence(&mut self, current: ColumnId, sequence_type: &SequenceType) {
        let base = self.nodes[current.0].name.clone();
        let length_type = DynamicType::Primitive(PrimitiveKind::Int32);
        self.add_child(current, format!("{}{}", base, LENGTH_COLUMN_SUFFIX), &length_type);

        let element = sequence_type.content_type();
        for i in 0..sequence_type.bound() {
            let child = self.add_child(current, format!("{}[{}]", base, i), element);
            self.build_column_info(child, element);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        AliasType, EnumType, Member, SequenceType, StructType, UnionCase, UnionType,
    };

    fn child_names(tree: &ColumnTree, id: ColumnId) -> Vec<String> {
        tree.children(id)
            .iter()
            .map(|&c| tree.node(c).name().to_string())
            .collect()
    }

    #[test]
    fn test_struct_with_parent_members_first() {
        let base = StructType::new("Base").member(Member::new("id", PrimitiveKind::Int32));
        let ty = StructType::new("Derived")
            .extends(base)
            .member(Member::new("x", PrimitiveKind::Float64))
            .into();

        let tree = ColumnTree::compile(&ty);
        assert_eq!(child_names(&tree, tree.root()), vec!["id", "x"]);
        assert_eq!(tree.column_count(), 2);
    }

    #[test]
    fn test_sequence_reserves_bound() {
        let ty = StructType::new("S")
            .member(Member::new("c", SequenceType::new(PrimitiveKind::Int32, 3)))
            .into();

        let tree = ColumnTree::compile(&ty);
        let c = tree.children(tree.root())[0];
        assert_eq!(tree.node(c).kind(), TypeKind::Sequence);
        assert_eq!(
            child_names(&tree, c),
            vec!["c.length", "c[0]", "c[1]", "c[2]"]
        );
        let length = tree.children(c)[0];
        assert_eq!(
            tree.node(length).kind(),
            TypeKind::Primitive(PrimitiveKind::Int32)
        );
    }

    #[test]
    fn test_multi_dimensional_array_row_major() {
        let ty = StructType::new("S")
            .member(Member::new("m", ArrayType::new(PrimitiveKind::UInt8, &[2, 3])))
            .into();

        let tree = ColumnTree::compile(&ty);
        let m = tree.children(tree.root())[0];
        assert_eq!(
            child_names(&tree, m),
            vec!["m[0][0]", "m[0][1]", "m[0][2]", "m[1][0]", "m[1][1]", "m[1][2]"]
        );
    }

    #[test]
    fn test_union_columns() {
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
        assert_eq!(child_names(&tree, tree.root()), vec!["disc", "x", "p"]);
        assert_eq!(tree.column_count(), 4);
    }

    #[test]
    fn test_alias_is_transparent() {
        let seq = AliasType::new("Samples", SequenceType::new(PrimitiveKind::Int16, 2));
        let ty = StructType::new("S").member(Member::new("s", seq)).into();

        let tree = ColumnTree::compile(&ty);
        let s = tree.children(tree.root())[0];
        assert_eq!(tree.node(s).kind(), TypeKind::Sequence);
        assert!(tree.node(s).is_collection());
        assert_eq!(child_names(&tree, s), vec!["s.length", "s[0]", "s[1]"]);
    }

    #[test]
    fn test_leaves_and_opaque() {
        let ty = StructType::new("S")
            .member(Member::new("e", EnumType::new("E").enumerator("A", 0)))
            .member(Member::new("o", DynamicType::Opaque("map<string,long>".into())))
            .member(Member::new("t", DynamicType::string()))
            .into();

        let tree = ColumnTree::compile(&ty);
        let leaves: Vec<_> = tree
            .leaves()
            .into_iter()
            .map(|l| tree.node(l).name().to_string())
            .collect();
        assert_eq!(leaves, vec!["e", "o", "t"]);
    }

    #[test]
    fn test_parent_back_reference() {
        let ty = StructType::new("S")
            .member(Member::new("c", SequenceType::new(PrimitiveKind::Int32, 1)))
            .into();

        let tree = ColumnTree::compile(&ty);
        let c = tree.children(tree.root())[0];
        for &child in tree.children(c) {
            assert_eq!(tree.parent(child), Some(c));
        }
        assert_eq!(tree.parent(c), Some(tree.root()));
        assert!(!tree.node(tree.root()).has_parent());
    }

    #[test]
    fn test_compile_is_deterministic() {
        let ty: DynamicType = StructType::new("S")
            .member(Member::new(
                "u",
                UnionType::new("U", PrimitiveKind::Int32)
                    .case(UnionCase::new("x", ArrayType::new(PrimitiveKind::Int32, &[2]), &[0])),
            ))
            .into();

        assert_eq!(ColumnTree::compile(&ty), ColumnTree::compile(&ty));
    }
}
