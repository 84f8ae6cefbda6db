//! Circuit inputs supplied as a flat JSON object of strings.
//!
//! ```json
//! { "PreImage": "68656c6c6f20776f726c64", "Hash": "b94d27b9..." }
//! ```
//!
//! Field elements are decimal strings; byte strings are hex.

use std::{collections::HashMap, path::Path, str::FromStr};

use ark_ff::PrimeField;
use serde::Deserialize;

use crate::utils::errors::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct CircuitInput {
    values: HashMap<String, String>,
}

impl CircuitInput {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Result<&str, ConfigError> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingInputKey(key.to_string()))
    }

    /// Decimal field element, reduced modulo the field order.
    pub fn field<F: PrimeField>(&self, key: &str) -> Result<F, ConfigError> {
        let raw = self.get(key)?;
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed(key, "expected a decimal integer"));
        }
        F::from_str(raw).map_err(|_| malformed(key, "not a field element"))
    }

    /// Any integer type parsed from its decimal form.
    pub fn integer<T: FromStr>(&self, key: &str) -> Result<T, ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        self.get(key)?
            .parse()
            .map_err(|e: T::Err| malformed(key, &e.to_string()))
    }

    pub fn hex_bytes(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        hex::decode(self.get(key)?).map_err(|e| malformed(key, &e.to_string()))
    }
}

fn malformed(key: &str, reason: &str) -> ConfigError {
    ConfigError::MalformedInput {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;

    #[test]
    fn parses_fields_and_hex() {
        let input =
            CircuitInput::from_json(r#"{"X": "2", "E": "12", "PreImage": "68656c6c6f"}"#).unwrap();
        assert_eq!(input.field::<Fr>("X").unwrap(), Fr::from(2u64));
        assert_eq!(input.integer::<u8>("E").unwrap(), 12);
        assert_eq!(input.hex_bytes("PreImage").unwrap(), b"hello".to_vec());
    }

    #[test]
    fn missing_key_is_an_error() {
        let input = CircuitInput::from_json(r#"{"X": "2"}"#).unwrap();
        assert!(matches!(
            input.field::<Fr>("Y"),
            Err(ConfigError::MissingInputKey(key)) if key == "Y"
        ));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let input = CircuitInput::from_json(r#"{"X": "0x10", "E": "300", "H": "zz"}"#).unwrap();
        assert!(matches!(
            input.field::<Fr>("X"),
            Err(ConfigError::MalformedInput { .. })
        ));
        assert!(input.integer::<u8>("E").is_err());
        assert!(input.hex_bytes("H").is_err());
    }

    #[test]
    fn non_string_values_are_rejected() {
        assert!(CircuitInput::from_json(r#"{"X": 2}"#).is_err());
    }
}
