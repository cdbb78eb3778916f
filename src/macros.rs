/// Builds a [`Value`](crate::Value) from a literal description.
///
/// - `{ "name": value, ... }` builds a struct sample; unset optional members
///   are simply left out
/// - `[a, b, ...]` builds an array or sequence sample
/// - `union <discriminator> => value` builds a union sample
/// - `enum <value>` builds an enumeration sample from its numeric value
/// - anything else goes through `Value::from`
///
/// ```rust
/// use flatcsv::{sample, Value};
///
/// let s = sample!({ "a": 5, "c": [7, 9], "u": (union 2 => 3.5) });
/// assert_eq!(s.get("a"), Some(&Value::Int(5)));
/// ```
#[macro_export]
macro_rules! sample {
    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Sequence(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Sequence(vec![$($crate::sample!($elem)),*])
    };

    ({}) => {
        $crate::Value::Struct($crate::MemberMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut members = $crate::MemberMap::new();
        $(
            members.insert($key, $crate::sample!($value));
        )*
        $crate::Value::Struct(members)
    }};

    (union $disc:expr => $value:tt) => {
        $crate::Value::union($disc, $crate::sample!($value))
    };

    (enum $value:expr) => {
        $crate::Value::Enum($value)
    };

    // parenthesized forms, so unions and enums nest as single token trees
    (( $($inner:tt)+ )) => {
        $crate::sample!($($inner)+)
    };

    ($other:expr) => {
        $crate::Value::from($other)
    };
}

#[cfg(test)]
mod tests {
    use crate::{MemberMap, Value};

    #[test]
    fn test_sample_macro_leaves() {
        assert_eq!(sample!(true), Value::Bool(true));
        assert_eq!(sample!(42), Value::Int(42));
        assert_eq!(sample!(3.5), Value::Float(3.5));
        assert_eq!(sample!("hello"), Value::String("hello".to_string()));
        assert_eq!(sample!(enum 2), Value::Enum(2));
    }

    #[test]
    fn test_sample_macro_nesting() {
        assert_eq!(sample!({}), Value::Struct(MemberMap::new()));
        assert_eq!(sample!([]), Value::Sequence(vec![]));

        let s = sample!({
            "a": 5,
            "c": [[1, 2], [3]],
            "u": (union 1 => { "x": true })
        });
        let members = s.as_struct().unwrap();
        assert_eq!(members.len(), 3);
        assert_eq!(
            members.get("c"),
            Some(&Value::from(vec![vec![1, 2], vec![3]]))
        );
        match members.get("u") {
            Some(Value::Union {
                discriminator: 1,
                value: Some(inner),
            }) => assert_eq!(inner.get("x"), Some(&Value::Bool(true))),
            other => panic!("unexpected union sample: {other:?}"),
        }
    }
}
