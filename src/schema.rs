//! Self-describing type schema of the samples written to CSV.
//!
//! A [`DynamicType`] describes one stream's data type: primitives, strings,
//! enumerations, aliases, structures (with single inheritance and optional
//! members), tagged unions, fixed multi-dimensional arrays and bounded
//! sequences. The schema is consumed read-only: the column layout is compiled
//! from it once and every sample is traversed against it.
//!
//! ## Building Schemas
//!
//! ```rust
//! use flatcsv::schema::{DynamicType, Member, PrimitiveKind, SequenceType, StructType};
//!
//! let ty: DynamicType = StructType::new("S")
//!     .member(Member::new("a", PrimitiveKind::Int32))
//!     .member(Member::optional("b", PrimitiveKind::Int32))
//!     .member(Member::new("c", SequenceType::new(PrimitiveKind::Int32, 3)))
//!     .into();
//!
//! assert_eq!(ty.name(), "S");
//! assert!(ty.is_aggregate());
//! ```

use std::fmt;

/// Kind of a schema node, with aliases reported as [`TypeKind::Alias`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    String,
    Enumeration,
    Alias,
    Structure,
    Union,
    Array,
    Sequence,
    Opaque,
}

impl TypeKind {
    /// Whether values of this kind are laid out as indexed elements.
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, TypeKind::Array | TypeKind::Sequence)
    }

    /// Whether values of this kind contain named members.
    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        matches!(self, TypeKind::Structure | TypeKind::Union)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Primitive(kind) => write!(f, "{}", kind),
            TypeKind::String => f.write_str("string"),
            TypeKind::Enumeration => f.write_str("enumeration"),
            TypeKind::Alias => f.write_str("alias"),
            TypeKind::Structure => f.write_str("structure"),
            TypeKind::Union => f.write_str("union"),
            TypeKind::Array => f.write_str("array"),
            TypeKind::Sequence => f.write_str("sequence"),
            TypeKind::Opaque => f.write_str("opaque"),
        }
    }
}

/// Primitive (fixed-size scalar) types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Octet,
    Char,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl PrimitiveKind {
    /// IDL-style type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Octet => "octet",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int8 => "int8",
            PrimitiveKind::UInt8 => "uint8",
            PrimitiveKind::Int16 => "int16",
            PrimitiveKind::UInt16 => "uint16",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::UInt32 => "uint32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::UInt64 => "uint64",
            PrimitiveKind::Float32 => "float32",
            PrimitiveKind::Float64 => "float64",
        }
    }

    #[must_use]
    pub const fn is_signed_integer(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int8 | PrimitiveKind::Int16 | PrimitiveKind::Int32 | PrimitiveKind::Int64
        )
    }

    #[must_use]
    pub const fn is_unsigned_integer(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Octet
                | PrimitiveKind::UInt8
                | PrimitiveKind::UInt16
                | PrimitiveKind::UInt32
                | PrimitiveKind::UInt64
        )
    }

    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, PrimitiveKind::Float32 | PrimitiveKind::Float64)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node of the type schema.
#[derive(Clone, Debug, PartialEq)]
pub enum DynamicType {
    Primitive(PrimitiveKind),
    /// Character string, optionally bounded.
    String(Option<u32>),
    Enum(EnumType),
    Alias(AliasType),
    Struct(StructType),
    Union(UnionType),
    Array(ArrayType),
    Sequence(SequenceType),
    /// A type this crate does not expand (e.g. a map). Laid out as one column.
    Opaque(String),
}

impl DynamicType {
    /// Unbounded string type.
    #[must_use]
    pub fn string() -> Self {
        DynamicType::String(None)
    }

    #[must_use]
    pub fn kind(&self) -> TypeKind {
        match self {
            DynamicType::Primitive(kind) => TypeKind::Primitive(*kind),
            DynamicType::String(_) => TypeKind::String,
            DynamicType::Enum(_) => TypeKind::Enumeration,
            DynamicType::Alias(_) => TypeKind::Alias,
            DynamicType::Struct(_) => TypeKind::Structure,
            DynamicType::Union(_) => TypeKind::Union,
            DynamicType::Array(_) => TypeKind::Array,
            DynamicType::Sequence(_) => TypeKind::Sequence,
            DynamicType::Opaque(_) => TypeKind::Opaque,
        }
    }

    /// Type name. Anonymous collections report their kind.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            DynamicType::Primitive(kind) => kind.name(),
            DynamicType::String(_) => "string",
            DynamicType::Enum(ty) => &ty.name,
            DynamicType::Alias(ty) => &ty.name,
            DynamicType::Struct(ty) => &ty.name,
            DynamicType::Union(ty) => &ty.name,
            DynamicType::Array(_) => "array",
            DynamicType::Sequence(_) => "sequence",
            DynamicType::Opaque(name) => name,
        }
    }

    /// Follows alias targets until a non-alias type is reached.
    #[must_use]
    pub fn resolve(&self) -> &DynamicType {
        let mut current = self;
        while let DynamicType::Alias(alias) = current {
            current = alias.related_type();
        }
        current
    }

    /// Whether the alias-resolved type is a structure or a union.
    #[must_use]
    pub fn is_aggregate(&self) -> bool {
        self.resolve().kind().is_aggregate()
    }
}

impl From<PrimitiveKind> for DynamicType {
    fn from(kind: PrimitiveKind) -> Self {
        DynamicType::Primitive(kind)
    }
}

impl From<EnumType> for DynamicType {
    fn from(ty: EnumType) -> Self {
        DynamicType::Enum(ty)
    }
}

impl From<AliasType> for DynamicType {
    fn from(ty: AliasType) -> Self {
        DynamicType::Alias(ty)
    }
}

impl From<StructType> for DynamicType {
    fn from(ty: StructType) -> Self {
        DynamicType::Struct(ty)
    }
}

impl From<UnionType> for DynamicType {
    fn from(ty: UnionType) -> Self {
        DynamicType::Union(ty)
    }
}

impl From<ArrayType> for DynamicType {
    fn from(ty: ArrayType) -> Self {
        DynamicType::Array(ty)
    }
}

impl From<SequenceType> for DynamicType {
    fn from(ty: SequenceType) -> Self {
        DynamicType::Sequence(ty)
    }
}

/// One labelled value of an enumeration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enumerator {
    pub name: String,
    pub value: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub enumerators: Vec<Enumerator>,
}

impl EnumType {
    pub fn new(name: impl Into<String>) -> Self {
        EnumType {
            name: name.into(),
            enumerators: Vec::new(),
        }
    }

    #[must_use]
    pub fn enumerator(mut self, name: impl Into<String>, value: i32) -> Self {
        self.enumerators.push(Enumerator {
            name: name.into(),
            value,
        });
        self
    }

    /// Label of the enumerator with the given value.
    #[must_use]
    pub fn label(&self, value: i32) -> Option<&str> {
        self.enumerators
            .iter()
            .find(|e| e.value == value)
            .map(|e| e.name.as_str())
    }
}

/// A named alias (typedef) of another type.
#[derive(Clone, Debug, PartialEq)]
pub struct AliasType {
    pub name: String,
    related: Box<DynamicType>,
}

impl AliasType {
    pub fn new(name: impl Into<String>, related: impl Into<DynamicType>) -> Self {
        AliasType {
            name: name.into(),
            related: Box::new(related.into()),
        }
    }

    /// The aliased type, which may itself be an alias.
    #[must_use]
    pub fn related_type(&self) -> &DynamicType {
        &self.related
    }
}

/// A structure member.
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    pub name: String,
    pub ty: DynamicType,
    pub optional: bool,
}

impl Member {
    pub fn new(name: impl Into<String>, ty: impl Into<DynamicType>) -> Self {
        Member {
            name: name.into(),
            ty: ty.into(),
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>, ty: impl Into<DynamicType>) -> Self {
        Member {
            optional: true,
            ..Member::new(name, ty)
        }
    }
}

/// A structure, optionally extending a base structure.
#[derive(Clone, Debug, PartialEq)]
pub struct StructType {
    pub name: String,
    parent: Option<Box<StructType>>,
    members: Vec<Member>,
}

impl StructType {
    pub fn new(name: impl Into<String>) -> Self {
        StructType {
            name: name.into(),
            parent: None,
            members: Vec::new(),
        }
    }

    /// Declares `parent` as the base type. Its members precede this type's.
    #[must_use]
    pub fn extends(mut self, parent: StructType) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    #[must_use]
    pub fn member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    #[must_use]
    pub fn parent(&self) -> Option<&StructType> {
        self.parent.as_deref()
    }

    /// Members declared by this type, excluding inherited ones.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Inherited and declared members, base-most first.
    #[must_use]
    pub fn all_members(&self) -> Vec<&Member> {
        let mut members = match &self.parent {
            Some(parent) => parent.all_members(),
            None => Vec::new(),
        };
        members.extend(self.members.iter());
        members
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// A union case: a member selected by one or more discriminator labels.
#[derive(Clone, Debug, PartialEq)]
pub struct UnionCase {
    pub name: String,
    pub ty: DynamicType,
    pub labels: Vec<i64>,
    pub is_default: bool,
}

impl UnionCase {
    pub fn new(name: impl Into<String>, ty: impl Into<DynamicType>, labels: &[i64]) -> Self {
        UnionCase {
            name: name.into(),
            ty: ty.into(),
            labels: labels.to_vec(),
            is_default: false,
        }
    }

    /// The case selected when no other label matches.
    pub fn default_case(name: impl Into<String>, ty: impl Into<DynamicType>) -> Self {
        UnionCase {
            is_default: true,
            ..UnionCase::new(name, ty, &[])
        }
    }
}

/// A discriminated union.
#[derive(Clone, Debug, PartialEq)]
pub struct UnionType {
    pub name: String,
    discriminator: Box<DynamicType>,
    cases: Vec<UnionCase>,
}

impl UnionType {
    pub fn new(name: impl Into<String>, discriminator: impl Into<DynamicType>) -> Self {
        UnionType {
            name: name.into(),
            discriminator: Box::new(discriminator.into()),
            cases: Vec::new(),
        }
    }

    #[must_use]
    pub fn case(mut self, case: UnionCase) -> Self {
        self.cases.push(case);
        self
    }

    #[must_use]
    pub fn discriminator(&self) -> &DynamicType {
        &self.discriminator
    }

    #[must_use]
    pub fn cases(&self) -> &[UnionCase] {
        &self.cases
    }

    /// Case selected by `discriminator`, falling back to the default case.
    #[must_use]
    pub fn selected_case(&self, discriminator: i64) -> Option<&UnionCase> {
        self.cases
            .iter()
            .find(|c| c.labels.contains(&discriminator))
            .or_else(|| self.cases.iter().find(|c| c.is_default))
    }
}

/// A fixed-size, possibly multi-dimensional array.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayType {
    element: Box<DynamicType>,
    dimensions: Vec<u32>,
}

impl ArrayType {
    pub fn new(element: impl Into<DynamicType>, dimensions: &[u32]) -> Self {
        ArrayType {
            element: Box::new(element.into()),
            dimensions: dimensions.to_vec(),
        }
    }

    #[must_use]
    pub fn content_type(&self) -> &DynamicType {
        &self.element
    }

    #[must_use]
    pub fn dimensions(&self) -> &[u32] {
        &self.dimensions
    }

    #[must_use]
    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    /// Product of all dimensions.
    #[must_use]
    pub fn total_element_count(&self) -> usize {
        if self.dimensions.is_empty() {
            return 0;
        }
        self.dimensions.iter().map(|&d| d as usize).product()
    }
}

/// A variable-length sequence with a maximum element count.
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceType {
    element: Box<DynamicType>,
    bound: u32,
}

impl SequenceType {
    pub fn new(element: impl Into<DynamicType>, bound: u32) -> Self {
        SequenceType {
            element: Box::new(element.into()),
            bound,
        }
    }

    #[must_use]
    pub fn content_type(&self) -> &DynamicType {
        &self.element
    }

    #[must_use]
    pub fn bound(&self) -> u32 {
        self.bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_nested_alias() {
        let inner = AliasType::new("Meters", PrimitiveKind::Float64);
        let outer: DynamicType = AliasType::new("Distance", inner).into();

        assert_eq!(outer.kind(), TypeKind::Alias);
        assert_eq!(outer.name(), "Distance");
        assert_eq!(outer.resolve(), &DynamicType::Primitive(PrimitiveKind::Float64));
    }

    #[test]
    fn test_all_members_base_first() {
        let base = StructType::new("Base").member(Member::new("id", PrimitiveKind::Int32));
        let derived = StructType::new("Derived")
            .extends(base)
            .member(Member::optional("note", DynamicType::string()));

        let names: Vec<_> = derived.all_members().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["id", "note"]);
        assert_eq!(derived.member_count(), 1);
        assert_eq!(derived.parent().map(|p| p.name.as_str()), Some("Base"));
    }

    #[test]
    fn test_selected_case_falls_back_to_default() {
        let union = UnionType::new("U", PrimitiveKind::Int32)
            .case(UnionCase::new("x", PrimitiveKind::Int32, &[1, 3]))
            .case(UnionCase::default_case("other", DynamicType::string()));

        assert_eq!(union.selected_case(3).map(|c| c.name.as_str()), Some("x"));
        assert_eq!(union.selected_case(7).map(|c| c.name.as_str()), Some("other"));
    }

    #[test]
    fn test_array_total_element_count() {
        assert_eq!(ArrayType::new(PrimitiveKind::Int8, &[2, 3, 4]).total_element_count(), 24);
        assert_eq!(ArrayType::new(PrimitiveKind::Int8, &[]).total_element_count(), 0);
    }

    #[test]
    fn test_enum_label() {
        let color = EnumType::new("Color").enumerator("RED", 0).enumerator("BLUE", 4);
        assert_eq!(color.label(4), Some("BLUE"));
        assert_eq!(color.label(1), None);
    }
}
