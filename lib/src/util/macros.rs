/// Builds a [`Dict`](crate::value::Dict) from `key => value` pairs.
///
/// ```rust
/// use vss::value::Value;
///
/// let dict = vss::dict! { "a" => 1u8, "b" => "two" };
/// assert_eq!(dict["b"], Value::from("two"));
/// ```
#[macro_export]
macro_rules! dict {
    ($($key:expr => $value:expr),* $(,)?) => ({
        #[allow(unused_mut)]
        let mut dict = $crate::value::Dict::new();
        $(dict.insert(std::sync::Arc::<str>::from($key), $crate::value::Value::from($value));)*
        dict
    });
}

pub use dict;
