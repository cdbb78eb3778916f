//! Depth-first sample traversal.
//!
//! [`traverse`] walks a [`Value`] against its [`DynamicType`] and hands every
//! [`Event`] to a sink, in the order the [`RowFormatter`](crate::cursor::RowFormatter)
//! expects them. Leaf values are rendered to text on the way by
//! [`format_leaf`].
//!
//! The traversal is where sample values are checked against the schema: a
//! missing required member, a sequence longer than its bound or an integer out
//! of the range of its primitive kind is reported as [`Error::ValueMismatch`]
//! with the path of the offending member.
//!
//! ```rust
//! use flatcsv::schema::{Member, PrimitiveKind, StructType};
//! use flatcsv::traverse::collect_events;
//! use flatcsv::{sample, CsvOptions, OwnedEvent};
//!
//! let ty = StructType::new("S")
//!     .member(Member::new("a", PrimitiveKind::Int32))
//!     .into();
//! let events = collect_events(&ty, &sample!({ "a": 5 }), &CsvOptions::default()).unwrap();
//!
//! assert_eq!(events[0], OwnedEvent::BeginTopLevel);
//! assert_eq!(events[2], OwnedEvent::Value("5".to_string()));
//! ```

use crate::error::{Error, Result};
use crate::event::{Event, OwnedEvent};
use crate::options::CsvOptions;
use crate::schema::{DynamicType, PrimitiveKind, StructType, UnionType};
use crate::value::Value;

/// Traverses `value` as a top-level sample of type `ty`.
///
/// # Errors
///
/// Returns [`Error::UnsupportedType`] if `ty` is not a struct or union,
/// [`Error::ValueMismatch`] if `value` does not match `ty`, and whatever error
/// `sink` returns.
pub fn traverse<F>(ty: &DynamicType, value: &Value, options: &CsvOptions, sink: F) -> Result<()>
where
    F: FnMut(Event<'_>) -> Result<()>,
{
    let mut traversal = Traversal {
        options,
        sink,
        path: String::new(),
    };
    traversal.visit_top_level(ty, value)
}

/// Traverses `value` and records the events.
///
/// # Errors
///
/// See [`traverse`].
pub fn collect_events(
    ty: &DynamicType,
    value: &Value,
    options: &CsvOptions,
) -> Result<Vec<OwnedEvent>> {
    let mut events = Vec::new();
    traverse(ty, value, options, |event| {
        events.push(event.to_owned_event());
        Ok(())
    })?;
    Ok(events)
}

struct Traversal<'o, F> {
    options: &'o CsvOptions,
    sink: F,
    /// Qualified name of the member being visited, for error messages.
    path: String,
}

impl<F> Traversal<'_, F>
where
    F: FnMut(Event<'_>) -> Result<()>,
{
    #[inline]
    fn emit(&mut self, event: Event<'_>) -> Result<()> {
        (self.sink)(event)
    }

    fn mismatch(&self, expected: &str, found: &str) -> Error {
        Error::value_mismatch(&self.path, expected, found)
    }

    fn visit_top_level(&mut self, ty: &DynamicType, value: &Value) -> Result<()> {
        match ty.resolve() {
            DynamicType::Struct(struct_type) => {
                self.emit(Event::BeginTopLevel)?;
                self.visit_struct(struct_type, value)?;
                self.emit(Event::EndTopLevel)
            }
            DynamicType::Union(union_type) => {
                self.emit(Event::BeginTopLevel)?;
                self.visit_union(union_type, value)?;
                self.emit(Event::EndTopLevel)
            }
            other => Err(Error::unsupported_type(&format!(
                "top-level type '{}' of kind {} is not a struct or union",
                other.name(),
                other.kind()
            ))),
        }
    }

    fn visit_struct(&mut self, struct_type: &StructType, value: &Value) -> Result<()> {
        let members = match value {
            Value::Struct(members) => members,
            other => return Err(self.mismatch("struct", other.kind_name())),
        };

        let declared = struct_type.all_members();
        if let Some(unknown) = members
            .keys()
            .find(|name| !declared.iter().any(|m| &m.name == *name))
        {
            return Err(self.mismatch(
                &format!("a member of '{}'", struct_type.name),
                &format!("unknown member '{}'", unknown),
            ));
        }

        for member in declared {
            let mark = self.path.len();
            self.path.push('.');
            self.path.push_str(&member.name);

            match members.get(&member.name) {
                Some(value) => self.visit_member(&member.name, &member.ty, value)?,
                None if member.optional => {
                    self.emit(Event::BeginUnsetOptionalMember(&member.name))?;
                    self.emit(Event::EndUnsetOptionalMember(&member.name))?;
                }
                None => return Err(self.mismatch("a value", "nothing")),
            }
            self.path.truncate(mark);
        }
        Ok(())
    }

    fn visit_union(&mut self, union_type: &UnionType, value: &Value) -> Result<()> {
        let (discriminator, case_value) = match value {
            Value::Union {
                discriminator,
                value,
            } => (*discriminator, value.as_deref()),
            other => return Err(self.mismatch("union", other.kind_name())),
        };

        let disc_value = discriminator_value(union_type.discriminator(), discriminator);
        let text = format_leaf(union_type.discriminator(), &disc_value, self.options)
            .map_err(|_| self.mismatch("a discriminator value", &discriminator.to_string()))?;
        self.emit(Event::BeginUnionDiscriminator)?;
        self.emit(Event::Value(&text))?;
        self.emit(Event::EndUnionDiscriminator)?;

        match (union_type.selected_case(discriminator), case_value) {
            (Some(case), Some(case_value)) => {
                let mark = self.path.len();
                self.path.push('.');
                self.path.push_str(&case.name);
                self.visit_member(&case.name, &case.ty, case_value)?;
                self.path.truncate(mark);
                Ok(())
            }
            (Some(case), None) => Err(self.mismatch(
                &format!("a value for case '{}'", case.name),
                "nothing",
            )),
            // no case selected: every case column is filled
            (None, None) => Ok(()),
            (None, Some(_)) => Err(self.mismatch(
                &format!("a case of '{}'", union_type.name),
                &format!("discriminator {}", discriminator),
            )),
        }
    }

    /// Visits a named struct member or union case.
    fn visit_member(&mut self, name: &str, ty: &DynamicType, value: &Value) -> Result<()> {
        match ty.resolve() {
            DynamicType::Struct(struct_type) => {
                self.emit(Event::BeginComplexType(name))?;
                self.visit_struct(struct_type, value)?;
                self.emit(Event::EndComplexType(name))
            }
            DynamicType::Union(union_type) => {
                self.emit(Event::BeginComplexType(name))?;
                self.visit_union(union_type, value)?;
                self.emit(Event::EndComplexType(name))
            }
            DynamicType::Array(_) | DynamicType::Sequence(_) => {
                self.visit_collection(name, ty, value)
            }
            leaf => {
                let text = self.format(leaf, value)?;
                self.emit(Event::BeginPrimitiveType(name))?;
                self.emit(Event::Value(&text))?;
                self.emit(Event::EndPrimitiveType(name))
            }
        }
    }

    /// Visits an array or sequence. Nested collections keep the member name.
    fn visit_collection(&mut self, name: &str, ty: &DynamicType, value: &Value) -> Result<()> {
        let elements = match value {
            Value::Sequence(elements) => elements.as_slice(),
            other => return Err(self.mismatch(ty.resolve().name(), other.kind_name())),
        };

        let element_type = match ty.resolve() {
            DynamicType::Array(array_type) => {
                let expected = array_type.total_element_count();
                if elements.len() != expected {
                    return Err(self.mismatch(
                        &format!("{} elements", expected),
                        &format!("{} elements", elements.len()),
                    ));
                }
                array_type.content_type()
            }
            DynamicType::Sequence(sequence_type) => {
                let bound = sequence_type.bound() as usize;
                if elements.len() > bound {
                    return Err(self.mismatch(
                        &format!("at most {} elements", bound),
                        &format!("{} elements", elements.len()),
                    ));
                }
                sequence_type.content_type()
            }
            other => return Err(self.mismatch("array or sequence", other.name())),
        };

        self.emit(Event::BeginArray(name))?;
        for (index, element) in elements.iter().enumerate() {
            let mark = self.path.len();
            self.path.push_str(&format!("[{}]", index));
            self.visit_item(name, element_type, index as u32, element)?;
            self.path.truncate(mark);
        }
        self.emit(Event::EndArray(name))
    }

    fn visit_item(
        &mut self,
        name: &str,
        ty: &DynamicType,
        index: u32,
        value: &Value,
    ) -> Result<()> {
        match ty.resolve() {
            DynamicType::Struct(struct_type) => {
                self.emit(Event::BeginComplexItem(index))?;
                self.visit_struct(struct_type, value)?;
                self.emit(Event::EndComplexItem(index))
            }
            DynamicType::Union(union_type) => {
                self.emit(Event::BeginComplexItem(index))?;
                self.visit_union(union_type, value)?;
                self.emit(Event::EndComplexItem(index))
            }
            DynamicType::Array(_) | DynamicType::Sequence(_) => {
                self.emit(Event::BeginArrayItem(index))?;
                self.visit_collection(name, ty, value)?;
                self.emit(Event::EndArrayItem(index))
            }
            leaf => {
                let text = self.format(leaf, value)?;
                self.emit(Event::BeginPrimitiveItem(index))?;
                self.emit(Event::Value(&text))?;
                self.emit(Event::EndPrimitiveItem(index))
            }
        }
    }

    fn format(&self, ty: &DynamicType, value: &Value) -> Result<String> {
        format_leaf(ty, value, self.options).map_err(|err| match err {
            Error::ValueMismatch {
                expected, found, ..
            } => self.mismatch(&expected, &found),
            other => other,
        })
    }
}

/// Value of a union discriminator as the leaf formatter expects it.
fn discriminator_value(ty: &DynamicType, discriminator: i64) -> Value {
    match ty.resolve() {
        DynamicType::Primitive(PrimitiveKind::Boolean) => Value::Bool(discriminator != 0),
        DynamicType::Primitive(PrimitiveKind::Char) => u32::try_from(discriminator)
            .ok()
            .and_then(char::from_u32)
            .map_or(Value::Int(discriminator), Value::Char),
        DynamicType::Enum(_) => i32::try_from(discriminator)
            .map_or(Value::Int(discriminator), Value::Enum),
        _ => Value::Int(discriminator),
    }
}

/// Renders the text of a leaf cell.
///
/// Integers and floats use their `Display` form (`float32` values are narrowed
/// first so `0.1f32` renders as `0.1`). Booleans render as `true`/`false`,
/// chars and strings verbatim. Enumerations render their label when
/// [`CsvOptions::enum_as_string`] is set and their numeric value otherwise.
/// Opaque leaves render the `Display` form of whatever value they hold.
///
/// # Errors
///
/// Returns [`Error::ValueMismatch`] (with an empty path) if `value` cannot
/// represent a `ty`, and [`Error::UnsupportedType`] if `ty` is an aggregate or
/// collection.
///
/// # Examples
///
/// ```rust
/// use flatcsv::schema::{DynamicType, EnumType, PrimitiveKind};
/// use flatcsv::traverse::format_leaf;
/// use flatcsv::{CsvOptions, Value};
///
/// let color: DynamicType = EnumType::new("Color").enumerator("RED", 0).enumerator("GREEN", 1).into();
/// let options = CsvOptions::default();
/// assert_eq!(format_leaf(&color, &Value::Enum(1), &options).unwrap(), "GREEN");
///
/// let numeric = options.with_enum_as_string(false);
/// assert_eq!(format_leaf(&color, &Value::Enum(1), &numeric).unwrap(), "1");
/// ```
pub fn format_leaf(ty: &DynamicType, value: &Value, options: &CsvOptions) -> Result<String> {
    let mismatch = |expected: &str| Error::value_mismatch("", expected, value.kind_name());

    match ty.resolve() {
        DynamicType::Primitive(kind) => format_primitive(*kind, value),
        DynamicType::String(bound) => {
            let text = value.as_str().ok_or_else(|| mismatch("string"))?;
            if let Some(bound) = bound {
                let length = text.chars().count();
                if length > *bound as usize {
                    return Err(Error::value_mismatch(
                        "",
                        &format!("at most {} characters", bound),
                        &format!("{} characters", length),
                    ));
                }
            }
            Ok(text.to_string())
        }
        DynamicType::Enum(enum_type) => {
            let numeric = match value {
                Value::Enum(e) => *e,
                Value::Int(_) | Value::UInt(_) => value
                    .as_i64()
                    .and_then(|i| i32::try_from(i).ok())
                    .ok_or_else(|| mismatch("enumerator value"))?,
                _ => return Err(mismatch("enum")),
            };
            match enum_type.label(numeric) {
                Some(label) if options.enum_as_string => Ok(label.to_string()),
                Some(_) => Ok(numeric.to_string()),
                None => Err(Error::value_mismatch(
                    "",
                    &format!("an enumerator of '{}'", enum_type.name),
                    &numeric.to_string(),
                )),
            }
        }
        DynamicType::Opaque(_) => Ok(value.to_string()),
        other => Err(Error::unsupported_type(&format!(
            "'{}' of kind {} is not a leaf type",
            other.name(),
            other.kind()
        ))),
    }
}

fn format_primitive(kind: PrimitiveKind, value: &Value) -> Result<String> {
    let mismatch = || Error::value_mismatch("", kind.name(), &value.to_string());

    match kind {
        PrimitiveKind::Boolean => match value {
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(mismatch()),
        },
        PrimitiveKind::Char => match value {
            Value::Char(c) => Ok(c.to_string()),
            _ => Err(mismatch()),
        },
        PrimitiveKind::Float32 => value
            .as_f64()
            .map(|f| (f as f32).to_string())
            .ok_or_else(mismatch),
        PrimitiveKind::Float64 => value.as_f64().map(|f| f.to_string()).ok_or_else(mismatch),
        _ => {
            let integer = match value {
                Value::Int(i) => i128::from(*i),
                Value::UInt(u) => i128::from(*u),
                _ => return Err(mismatch()),
            };
            let (min, max) = integer_range(kind);
            if integer < min || integer > max {
                return Err(mismatch());
            }
            Ok(integer.to_string())
        }
    }
}

/// Inclusive range of an integer primitive kind.
fn integer_range(kind: PrimitiveKind) -> (i128, i128) {
    match kind {
        PrimitiveKind::Int8 => (i128::from(i8::MIN), i128::from(i8::MAX)),
        PrimitiveKind::Int16 => (i128::from(i16::MIN), i128::from(i16::MAX)),
        PrimitiveKind::Int32 => (i128::from(i32::MIN), i128::from(i32::MAX)),
        PrimitiveKind::Int64 => (i128::from(i64::MIN), i128::from(i64::MAX)),
        PrimitiveKind::Octet | PrimitiveKind::UInt8 => (0, i128::from(u8::MAX)),
        PrimitiveKind::UInt16 => (0, i128::from(u16::MAX)),
        PrimitiveKind::UInt32 => (0, i128::from(u32::MAX)),
        _ => (0, i128::from(u64::MAX)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MemberMap;
    use crate::schema::{
        AliasType, ArrayType, EnumType, Member, SequenceType, UnionCase,
    };

    fn events(ty: &DynamicType, value: &Value) -> Vec<OwnedEvent> {
        collect_events(ty, value, &CsvOptions::default()).unwrap()
    }

    fn members(pairs: Vec<(&str, Value)>) -> Value {
        Value::Struct(pairs.into_iter().collect::<MemberMap>())
    }

    #[test]
    fn test_unset_optional_member() {
        let ty: DynamicType = StructType::new("S")
            .member(Member::new("a", PrimitiveKind::Int32))
            .member(Member::optional("b", PrimitiveKind::Int32))
            .into();

        let events = events(&ty, &members(vec![("a", Value::from(5))]));
        assert_eq!(
            events,
            vec![
                OwnedEvent::BeginTopLevel,
                OwnedEvent::BeginPrimitiveType("a".into()),
                OwnedEvent::Value("5".into()),
                OwnedEvent::EndPrimitiveType("a".into()),
                OwnedEvent::BeginUnsetOptionalMember("b".into()),
                OwnedEvent::EndUnsetOptionalMember("b".into()),
                OwnedEvent::EndTopLevel,
            ]
        );
    }

    #[test]
    fn test_missing_required_member() {
        let ty: DynamicType = StructType::new("S")
            .member(Member::new("a", PrimitiveKind::Int32))
            .into();

        let err = collect_events(&ty, &members(vec![]), &CsvOptions::default()).unwrap_err();
        match err {
            Error::ValueMismatch { path, .. } => assert_eq!(path, ".a"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nested_sequence_items() {
        let ty: DynamicType = StructType::new("S")
            .member(Member::new(
                "m",
                SequenceType::new(SequenceType::new(PrimitiveKind::Int32, 2), 2),
            ))
            .into();

        let value = members(vec![("m", Value::from(vec![vec![4]]))]);
        let events = events(&ty, &value);
        assert_eq!(
            events[1..events.len() - 1],
            [
                OwnedEvent::BeginArray("m".into()),
                OwnedEvent::BeginArrayItem(0),
                OwnedEvent::BeginArray("m".into()),
                OwnedEvent::BeginPrimitiveItem(0),
                OwnedEvent::Value("4".into()),
                OwnedEvent::EndPrimitiveItem(0),
                OwnedEvent::EndArray("m".into()),
                OwnedEvent::EndArrayItem(0),
                OwnedEvent::EndArray("m".into()),
            ]
        );
    }

    #[test]
    fn test_sequence_over_bound() {
        let ty: DynamicType = StructType::new("S")
            .member(Member::new("c", SequenceType::new(PrimitiveKind::Int32, 1)))
            .into();

        let value = members(vec![("c", Value::from(vec![1, 2]))]);
        let err = collect_events(&ty, &value, &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, Error::ValueMismatch { ref path, .. } if path == ".c"));
    }

    #[test]
    fn test_array_needs_every_element() {
        let ty: DynamicType = StructType::new("S")
            .member(Member::new("m", ArrayType::new(PrimitiveKind::UInt8, &[2, 2])))
            .into();

        let short = members(vec![("m", Value::from(vec![1u8, 2, 3]))]);
        assert!(collect_events(&ty, &short, &CsvOptions::default()).is_err());

        let full = members(vec![("m", Value::from(vec![1u8, 2, 3, 4]))]);
        let events = events(&ty, &full);
        assert!(events.contains(&OwnedEvent::BeginPrimitiveItem(3)));
    }

    #[test]
    fn test_union_selects_default_case() {
        let ty: DynamicType = UnionType::new("U", PrimitiveKind::Int32)
            .case(UnionCase::new("x", PrimitiveKind::Int32, &[1]))
            .case(UnionCase::default_case("other", DynamicType::string()))
            .into();

        let events = events(&ty, &Value::union(7, "hello"));
        assert_eq!(
            events,
            vec![
                OwnedEvent::BeginTopLevel,
                OwnedEvent::BeginUnionDiscriminator,
                OwnedEvent::Value("7".into()),
                OwnedEvent::EndUnionDiscriminator,
                OwnedEvent::BeginPrimitiveType("other".into()),
                OwnedEvent::Value("hello".into()),
                OwnedEvent::EndPrimitiveType("other".into()),
                OwnedEvent::EndTopLevel,
            ]
        );
    }

    #[test]
    fn test_union_unknown_discriminator() {
        let ty: DynamicType = UnionType::new("U", PrimitiveKind::Int32)
            .case(UnionCase::new("x", PrimitiveKind::Int32, &[1]))
            .into();

        let err = collect_events(&ty, &Value::union(9, 1), &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, Error::ValueMismatch { .. }));

        let empty = Value::Union {
            discriminator: 9,
            value: None,
        };
        assert_eq!(events(&ty, &empty).len(), 5);
    }

    #[test]
    fn test_enum_discriminator_uses_label() {
        let kind = EnumType::new("Kind").enumerator("A", 0).enumerator("B", 1);
        let ty: DynamicType = UnionType::new("U", kind)
            .case(UnionCase::new("b", PrimitiveKind::Int32, &[1]))
            .into();

        let events = events(&ty, &Value::union(1, 3));
        assert_eq!(events[2], OwnedEvent::Value("B".into()));
    }

    #[test]
    fn test_alias_root_and_leaf() {
        let ty: DynamicType = AliasType::new(
            "Root",
            StructType::new("S").member(Member::new(
                "t",
                AliasType::new("Temperature", PrimitiveKind::Float32),
            )),
        )
        .into();

        let events = events(&ty, &members(vec![("t", Value::from(0.1f32))]));
        assert_eq!(events[2], OwnedEvent::Value("0.1".into()));
    }

    #[test]
    fn test_non_aggregate_root() {
        let ty = DynamicType::Primitive(PrimitiveKind::Int32);
        let err = collect_events(&ty, &Value::from(1), &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
    }

    #[test]
    fn test_integer_ranges() {
        let options = CsvOptions::default();
        let int8 = DynamicType::Primitive(PrimitiveKind::Int8);
        let uint64 = DynamicType::Primitive(PrimitiveKind::UInt64);

        assert_eq!(format_leaf(&int8, &Value::from(-128), &options).unwrap(), "-128");
        assert!(format_leaf(&int8, &Value::from(128), &options).is_err());
        assert_eq!(
            format_leaf(&uint64, &Value::from(u64::MAX), &options).unwrap(),
            u64::MAX.to_string()
        );
        assert!(format_leaf(&uint64, &Value::from(-1), &options).is_err());
    }

    #[test]
    fn test_bounded_string() {
        let options = CsvOptions::default();
        let bounded = DynamicType::String(Some(3));
        assert_eq!(format_leaf(&bounded, &Value::from("abc"), &options).unwrap(), "abc");
        assert!(format_leaf(&bounded, &Value::from("abcd"), &options).is_err());
    }

    #[test]
    fn test_unknown_member_is_rejected() {
        let ty: DynamicType = StructType::new("S")
            .member(Member::new("a", PrimitiveKind::Int32))
            .into();

        let value = members(vec![("a", Value::from(1)), ("zz", Value::from(2))]);
        assert!(collect_events(&ty, &value, &CsvOptions::default()).is_err());
    }
}
