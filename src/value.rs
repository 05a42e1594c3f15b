//! The dynamically typed value every setting resolves to.

use std::collections::BTreeMap;

pub use serde_value::Value;

/// The null representation the identity constructor produces for a setting
/// that has neither an explicit value nor a default.
pub const fn null() -> Value {
    Value::Option(None)
}

pub fn is_null(value: &Value) -> bool {
    matches!(value, Value::Option(None) | Value::Unit)
}

/// Conversion of plain Rust values into a setting [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for char {
    fn into_value(self) -> Value {
        Value::Char(self)
    }
}

macro_rules! into_value_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }
        )*
    };
}

into_value_scalar! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        Value::Option(self.map(|v| Box::new(v.into_value())))
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Seq(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<K: IntoValue, V: IntoValue> IntoValue for BTreeMap<K, V> {
    fn into_value(self) -> Value {
        Value::Map(
            self.into_iter()
                .map(|(k, v)| (k.into_value(), v.into_value()))
                .collect(),
        )
    }
}

/// Builds a map [`Value`] from `name => value` pairs.
///
/// ```rust
/// use next_settings::{settings_map, Value};
///
/// let batch = settings_map! {
///     "dsn" => "postgres",
///     "database" => settings_map! { "port" => 5432u16 },
/// };
/// assert!(matches!(batch, Value::Map(_)));
/// ```
#[macro_export]
macro_rules! settings_map {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = ::std::collections::BTreeMap::new();
        $(
            map.insert(
                $crate::Value::String(::std::string::String::from($key)),
                $crate::IntoValue::into_value($value),
            );
        )*
        $crate::Value::Map(map)
    }};
}
