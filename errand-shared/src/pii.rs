use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps a secret (credentials, signing keys) so that `Debug`, `Display` and
/// `Serialize` never print it. Read the value with [`Masked::expose`].
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(T);

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Masked<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("********")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_serialize_hide_value() {
        let secret = Masked::new("postgres://app:hunter2@db/errand".to_string());

        assert_eq!(format!("{:?}", secret), "********");
        assert_eq!(secret.to_string(), "********");
        assert_eq!(serde_json::to_string(&secret).unwrap(), "\"********\"");
        assert!(secret.expose().contains("hunter2"));
    }

    #[test]
    fn test_deserializes_from_plain_string() {
        let secret: Masked<String> = serde_json::from_str("\"s3cret\"").unwrap();
        assert_eq!(secret.into_inner(), "s3cret");
    }
}
