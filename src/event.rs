//! Traversal events driving the row formatter.
//!
//! A sample is delivered as a depth-first sequence of begin/end pairs, one per
//! schema construct actually present in the sample, with the formatted text of
//! each leaf carried by a [`Event::Value`] between the leaf's begin and end.
//!
//! For `struct S { int32 a; optional int32 b; }` with `a = 5` and `b` unset:
//!
//! ```text
//! BeginTopLevel
//!   BeginPrimitiveType("a") Value("5") EndPrimitiveType("a")
//!   BeginUnsetOptionalMember("b") EndUnsetOptionalMember("b")
//! EndTopLevel
//! ```
//!
//! Arrays and sequences both use [`Event::BeginArray`]; their elements use the
//! `*Item` events, carrying the element index.

use std::fmt;

/// One traversal event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event<'a> {
    BeginTopLevel,
    EndTopLevel,
    /// Named structure or union member.
    BeginComplexType(&'a str),
    EndComplexType(&'a str),
    /// Named primitive, string or enumeration member.
    BeginPrimitiveType(&'a str),
    EndPrimitiveType(&'a str),
    /// Array or sequence, named after its member.
    BeginArray(&'a str),
    EndArray(&'a str),
    /// Structure or union element of a collection.
    BeginComplexItem(u32),
    EndComplexItem(u32),
    /// Leaf element of a collection.
    BeginPrimitiveItem(u32),
    EndPrimitiveItem(u32),
    /// Collection element of a collection; wraps a nested `BeginArray`/`EndArray`.
    BeginArrayItem(u32),
    EndArrayItem(u32),
    BeginUnionDiscriminator,
    EndUnionDiscriminator,
    BeginUnsetOptionalMember(&'a str),
    EndUnsetOptionalMember(&'a str),
    /// Formatted text of the current leaf.
    Value(&'a str),
}

impl Event<'_> {
    /// Whether this event opens a construct.
    #[must_use]
    pub const fn is_begin(&self) -> bool {
        matches!(
            self,
            Event::BeginTopLevel
                | Event::BeginComplexType(_)
                | Event::BeginPrimitiveType(_)
                | Event::BeginArray(_)
                | Event::BeginComplexItem(_)
                | Event::BeginPrimitiveItem(_)
                | Event::BeginArrayItem(_)
                | Event::BeginUnionDiscriminator
                | Event::BeginUnsetOptionalMember(_)
        )
    }

    /// Converts to an owned event.
    #[must_use]
    pub fn to_owned_event(&self) -> OwnedEvent {
        OwnedEvent::from(*self)
    }
}

impl fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::BeginTopLevel => f.write_str("begin top level"),
            Event::EndTopLevel => f.write_str("end top level"),
            Event::BeginComplexType(name) => write!(f, "begin complex type '{}'", name),
            Event::EndComplexType(name) => write!(f, "end complex type '{}'", name),
            Event::BeginPrimitiveType(name) => write!(f, "begin primitive type '{}'", name),
            Event::EndPrimitiveType(name) => write!(f, "end primitive type '{}'", name),
            Event::BeginArray(name) => write!(f, "begin array '{}'", name),
            Event::EndArray(name) => write!(f, "end array '{}'", name),
            Event::BeginComplexItem(i) => write!(f, "begin complex item {}", i),
            Event::EndComplexItem(i) => write!(f, "end complex item {}", i),
            Event::BeginPrimitiveItem(i) => write!(f, "begin primitive item {}", i),
            Event::EndPrimitiveItem(i) => write!(f, "end primitive item {}", i),
            Event::BeginArrayItem(i) => write!(f, "begin array item {}", i),
            Event::EndArrayItem(i) => write!(f, "end array item {}", i),
            Event::BeginUnionDiscriminator => f.write_str("begin union discriminator"),
            Event::EndUnionDiscriminator => f.write_str("end union discriminator"),
            Event::BeginUnsetOptionalMember(name) => write!(f, "begin unset member '{}'", name),
            Event::EndUnsetOptionalMember(name) => write!(f, "end unset member '{}'", name),
            Event::Value(text) => write!(f, "value '{}'", text),
        }
    }
}

/// An [`Event`] owning its strings, for recording a traversal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnedEvent {
    BeginTopLevel,
    EndTopLevel,
    BeginComplexType(String),
    EndComplexType(String),
    BeginPrimitiveType(String),
    EndPrimitiveType(String),
    BeginArray(String),
    EndArray(String),
    BeginComplexItem(u32),
    EndComplexItem(u32),
    BeginPrimitiveItem(u32),
    EndPrimitiveItem(u32),
    BeginArrayItem(u32),
    EndArrayItem(u32),
    BeginUnionDiscriminator,
    EndUnionDiscriminator,
    BeginUnsetOptionalMember(String),
    EndUnsetOptionalMember(String),
    Value(String),
}

impl OwnedEvent {
    #[must_use]
    pub fn as_event(&self) -> Event<'_> {
        match self {
            OwnedEvent::BeginTopLevel => Event::BeginTopLevel,
            OwnedEvent::EndTopLevel => Event::EndTopLevel,
            OwnedEvent::BeginComplexType(name) => Event::BeginComplexType(name),
            OwnedEvent::EndComplexType(name) => Event::EndComplexType(name),
            OwnedEvent::BeginPrimitiveType(name) => Event::BeginPrimitiveType(name),
            OwnedEvent::EndPrimitiveType(name) => Event::EndPrimitiveType(name),
            OwnedEvent::BeginArray(name) => Event::BeginArray(name),
            OwnedEvent::EndArray(name) => Event::EndArray(name),
            OwnedEvent::BeginComplexItem(i) => Event::BeginComplexItem(*i),
            OwnedEvent::EndComplexItem(i) => Event::EndComplexItem(*i),
            OwnedEvent::BeginPrimitiveItem(i) => Event::BeginPrimitiveItem(*i),
            OwnedEvent::EndPrimitiveItem(i) => Event::EndPrimitiveItem(*i),
            OwnedEvent::BeginArrayItem(i) => Event::BeginArrayItem(*i),
            OwnedEvent::EndArrayItem(i) => Event::EndArrayItem(*i),
            OwnedEvent::BeginUnionDiscriminator => Event::BeginUnionDiscriminator,
            OwnedEvent::EndUnionDiscriminator => Event::EndUnionDiscriminator,
            OwnedEvent::BeginUnsetOptionalMember(name) => Event::BeginUnsetOptionalMember(name),
            OwnedEvent::EndUnsetOptionalMember(name) => Event::EndUnsetOptionalMember(name),
            OwnedEvent::Value(text) => Event::Value(text),
        }
    }
}

impl From<Event<'_>> for OwnedEvent {
    fn from(event: Event<'_>) -> Self {
        match event {
            Event::BeginTopLevel => OwnedEvent::BeginTopLevel,
            Event::EndTopLevel => OwnedEvent::EndTopLevel,
            Event::BeginComplexType(name) => OwnedEvent::BeginComplexType(name.to_string()),
            Event::EndComplexType(name) => OwnedEvent::EndComplexType(name.to_string()),
            Event::BeginPrimitiveType(name) => OwnedEvent::BeginPrimitiveType(name.to_string()),
            Event::EndPrimitiveType(name) => OwnedEvent::EndPrimitiveType(name.to_string()),
            Event::BeginArray(name) => OwnedEvent::BeginArray(name.to_string()),
            Event::EndArray(name) => OwnedEvent::EndArray(name.to_string()),
            Event::BeginComplexItem(i) => OwnedEvent::BeginComplexItem(i),
            Event::EndComplexItem(i) => OwnedEvent::EndComplexItem(i),
            Event::BeginPrimitiveItem(i) => OwnedEvent::BeginPrimitiveItem(i),
            Event::EndPrimitiveItem(i) => OwnedEvent::EndPrimitiveItem(i),
            Event::BeginArrayItem(i) => OwnedEvent::BeginArrayItem(i),
            Event::EndArrayItem(i) => OwnedEvent::EndArrayItem(i),
            Event::BeginUnionDiscriminator => OwnedEvent::BeginUnionDiscriminator,
            Event::EndUnionDiscriminator => OwnedEvent::EndUnionDiscriminator,
            Event::BeginUnsetOptionalMember(name) => {
                OwnedEvent::BeginUnsetOptionalMember(name.to_string())
            }
            Event::EndUnsetOptionalMember(name) => {
                OwnedEvent::EndUnsetOptionalMember(name.to_string())
            }
            Event::Value(text) => OwnedEvent::Value(text.to_string()),
        }
    }
}
