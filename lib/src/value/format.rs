use crate::error::{ErrorDetail, Result};
use crate::io::Source;

/// A text data format that deserializes into serde types.
pub trait Format: Sized {
    /// The data format's error type.
    type Error: serde::de::Error + ErrorDetail + 'static;

    /// Human-readable name of the format, used in error messages.
    const NAME: &'static str;

    /// Parses `string` as the data format `Self` as a `T` or returns an error
    /// if the `string` is an invalid `T`.
    fn from_str<T: serde::de::DeserializeOwned>(string: &str) -> Result<T, Self::Error>;

    fn read<I: Source + ?Sized, T: serde::de::DeserializeOwned>(input: &I) -> Result<T> {
        let input = input.read()?;
        Ok(Self::from_str(&input)?)
    }
}

macro_rules! impl_format {
    ($name:ident ($display:literal) : $func:expr, $E:ty) => (
        #[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
        pub struct $name;

        impl Format for $name {
            type Error = $E;

            const NAME: &'static str = $display;

            fn from_str<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, $E> {
                $func(s)
            }
        }
    );
}

impl_format!(Toml ("TOML"): toml::from_str, toml::de::Error);
impl_format!(Yaml ("YAML"): serde_yaml::from_str, serde_yaml::Error);
impl_format!(Json ("JSON"): serde_json::from_str, serde_json::Error);
