use std::sync::Arc;
use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

pub type Dict<K = Arc<str>, V = Value> = BTreeMap<K, V>;

/// Represents any valid front matter, configuration, or template value.
///
/// The set of variants is closed: template engines match on it exhaustively
/// instead of probing dynamic types.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Num(Num),
    Float(f64),
    String(Arc<str>),
    /// Trusted markup. Never produced by deserialization (any string
    /// deserializes as [`Value::String`]) and never escaped when rendered.
    Html(Arc<str>),
    Array(Arc<Vec<Value>>),
    Dict(Arc<Dict>),
}

impl Value {
    /// Wraps already-rendered markup so that it is emitted verbatim.
    pub fn html<S: Into<Arc<str>>>(markup: S) -> Value {
        Value::Html(markup.into())
    }

    /// The string content of a `String` or `Html` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Html(s) => Some(&**s),
            _ => None
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(v) => Some(&**v),
            _ => None
        }
    }

    /// Replaces every TOML datetime, which deserializes as a single-key map,
    /// with its string form, e.g. `2024-01-02`.
    pub fn unwrap_datetimes(self) -> Value {
        match self {
            Value::Dict(dict) => {
                if let (1, Some(Value::String(s))) = (dict.len(), dict.get(TOML_DATETIME_KEY)) {
                    return Value::String(s.clone());
                }

                let dict = Arc::try_unwrap(dict).unwrap_or_else(|dict| (*dict).clone());
                Value::from(unwrap_datetimes(dict))
            }
            Value::Array(array) => array.iter().cloned().map(Value::unwrap_datetimes).collect(),
            value => value,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Html(_) => "html",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
        }
    }
}

const TOML_DATETIME_KEY: &str = "$__toml_private_datetime";

/// [`Value::unwrap_datetimes()`] for every value in `dict`.
pub fn unwrap_datetimes(dict: Dict) -> Dict {
    dict.into_iter()
        .map(|(key, value)| (key, value.unwrap_datetimes()))
        .collect()
}

macro_rules! impl_from_primitive {
    ($($T:ty),+ => $E:ident::$kind:ident) => {
        $(
            impl From<$T> for $E {
                fn from(value: $T) -> Self {
                    $E::$kind(value.into())
                }
            }
        )+
    };
}

impl_from_primitive!(bool => Value::Bool);
impl_from_primitive!(f32, f64 => Value::Float);
impl_from_primitive!(&str => Value::String);
impl_from_primitive!(std::borrow::Cow<'_, str> => Value::String);
impl_from_primitive!(String => Value::String);
impl_from_primitive!(Arc<str> => Value::String);
impl_from_primitive!(Arc<Vec<Value>> => Value::Array);
impl_from_primitive!(Arc<Dict> => Value::Dict);
impl_from_primitive!(u8, u16, u32, u64, u128, usize => Value::Num);
impl_from_primitive!(i8, i16, i32, i64, i128, isize => Value::Num);

impl From<()> for Value  {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T> From<Option<T>> for Value where Value: From<T> {
    fn from(value: Option<T>) -> Self {
        value.map(Value::from).unwrap_or(Value::Null)
    }
}

impl<T> From<Vec<T>> for Value where Value: From<T> {
    fn from(value: Vec<T>) -> Self {
        value.into_iter()
            .map(Value::from)
            .collect()
    }
}

impl From<Dict> for Value {
    fn from(value: Dict) -> Self {
        Value::Dict(Arc::new(value))
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        let vec = iter.into_iter().collect::<Vec<Value>>();
        Value::Array(Arc::from(vec))
    }
}

/// A signed or unsigned integer value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Num {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    USize(usize),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    ISize(isize),
}

impl Num {
    /// Converts `self` into a `u128` if it is non-negative, otherwise into an
    /// `i128`.
    pub fn to_u128_lossy(self) -> Result<u128, i128> {
        Ok(match self {
            Num::U8(v) => v as u128,
            Num::U16(v) => v as u128,
            Num::U32(v) => v as u128,
            Num::U64(v) => v as u128,
            Num::U128(v) => v,
            Num::USize(v) => v as u128,
            Num::I8(v) if v >= 0 => v as u128,
            Num::I16(v) if v >= 0 => v as u128,
            Num::I32(v) if v >= 0 => v as u128,
            Num::I64(v) if v >= 0 => v as u128,
            Num::I128(v) if v >= 0 => v as u128,
            Num::ISize(v) if v >= 0 => v as u128,
            Num::I8(v) => return Err(v as i128),
            Num::I16(v) => return Err(v as i128),
            Num::I32(v) => return Err(v as i128),
            Num::I64(v) => return Err(v as i128),
            Num::I128(v) => return Err(v),
            Num::ISize(v) => return Err(v as i128),
        })
    }
}

impl PartialEq for Num {
    /// ```rust
    /// use vss::value::Num;
    ///
    /// assert!(Num::from(-0i8) == Num::from(0u8));
    /// assert!(Num::from(10i32) == Num::from(10u64));
    /// assert!(Num::from(-3i64) != Num::from(3u8));
    /// ```
    fn eq(&self, other: &Self) -> bool {
        match (self.to_u128_lossy(), other.to_u128_lossy()) {
            (Ok(a), Ok(b)) => a == b,
            (Err(a), Err(b)) => a == b,
            (Ok(_), Err(_)) | (Err(_), Ok(_)) => false,
        }
    }
}

impl Eq for Num { }

macro_rules! impl_from_for_num_value {
    ($($T:ty: $V:ident),* $(,)?) => ($(
        impl From<$T> for Num {
            fn from(value: $T) -> Num {
                Num::$V(value)
            }
        }
    )*)
}

impl_from_for_num_value! {
    u8: U8, u16: U16, u32: U32, u64: U64, u128: U128, usize: USize,
    i8: I8, i16: I16, i32: I32, i64: I64, i128: I128, isize: ISize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_into_closed_variants() {
        let value: Value = serde_yaml::from_str("{ a: 1, b: -2, c: 1.5, d: true, e: [x, ~] }").unwrap();
        let dict = value.as_dict().unwrap();

        assert_eq!(dict["a"], Value::from(1u8));
        assert_eq!(dict["b"], Value::from(-2i64));
        assert_eq!(dict["c"], Value::Float(1.5));
        assert_eq!(dict["d"], Value::Bool(true));
        assert_eq!(dict["e"], Value::from(vec![Value::from("x"), Value::Null]));
    }

    #[test]
    fn strings_never_deserialize_as_html() {
        let value: Value = toml::from_str::<Dict>("s = '<b>'").map(Value::from).unwrap();
        assert_eq!(value.as_dict().unwrap()["s"].kind(), "string");
        assert_eq!(Value::html("<b>").as_str(), Some("<b>"));
    }
}
