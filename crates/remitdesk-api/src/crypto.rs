//! Authentication payload signatures.
//!
//! A payload is a flat map of string fields plus a `hash` field carrying the
//! expected signature. Verification works as follows:
//!
//! 1. Every field except `hash`, sorted by key (byte order), is rendered as
//!    `key=value` and joined with `\n` (no trailing newline).
//! 2. A signing key is derived as `HMAC-SHA256(key = secret, msg = secret)`.
//! 3. The signature is the lowercase hex `HMAC-SHA256(key = signing_key, msg
//!    = canonical string)`.
//! 4. The payload is valid iff the signature equals `hash` exactly.
//!
//! The comparison runs in constant time.

use std::{collections::BTreeMap, fmt};

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Name of the field carrying the expected signature.
pub const HASH_FIELD: &str = "hash";

/// Result of signature validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// Whether the signature is valid.
    pub is_valid: bool,
    /// Error message if validation failed.
    pub error_message: Option<String>,
}

impl ValidationResult {
    /// Creates a successful validation result.
    pub fn valid() -> Self {
        Self { is_valid: true, error_message: None }
    }

    /// Creates a failed validation result with error message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self { is_valid: false, error_message: Some(message.into()) }
    }
}

/// Signature computation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The HMAC implementation rejected the key.
    InvalidKey,
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey => write!(f, "invalid HMAC key"),
        }
    }
}

impl std::error::Error for SignatureError {}

/// Field map submitted for authentication.
///
/// Keys are kept sorted, which is the order the canonical string needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthPayload {
    fields: BTreeMap<String, String>,
}

impl AuthPayload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Builds a payload from JSON values, skipping absent fields.
    ///
    /// Values are stringified canonically: strings verbatim, numbers in
    /// their JSON decimal form, booleans as `true`/`false`, `null` as the
    /// empty string, arrays and objects as compact JSON. Clients must sign
    /// the same rendering.
    pub fn from_json_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<&'a Value>)>,
    {
        let mut payload = Self::new();
        for (key, value) in fields {
            if let Some(value) = value {
                payload.insert(key, canonical_value(value));
            }
        }
        payload
    }

    /// Returns a field value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Returns the expected signature, if present.
    pub fn hash(&self) -> Option<&str> {
        self.get(HASH_FIELD)
    }

    /// Builds the string that gets signed.
    ///
    /// `hash` is excluded. A payload holding only `hash` yields an empty
    /// string.
    pub fn canonical_string(&self) -> String {
        self.fields
            .iter()
            .filter(|(key, _)| key.as_str() != HASH_FIELD)
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AuthPayload {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self { fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// Renders a JSON value the way it is signed.
pub fn canonical_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Derives the per-secret signing key: the secret HMACed with itself.
///
/// # Errors
///
/// Returns `SignatureError::InvalidKey` if the HMAC key is rejected.
pub fn derive_signing_key(secret: &str) -> Result<Vec<u8>, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(secret.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Computes the hex signature a client attaches as `hash`.
///
/// # Errors
///
/// Returns `SignatureError::InvalidKey` if the HMAC key is rejected.
pub fn sign(payload: &AuthPayload, secret: &str) -> Result<String, SignatureError> {
    let signing_key = derive_signing_key(secret)?;
    generate_hmac_hex(payload.canonical_string().as_bytes(), &signing_key)
}

/// Generates HMAC-SHA256 as a lowercase hex string.
///
/// # Errors
///
/// Returns `SignatureError::InvalidKey` if the HMAC key is rejected.
pub fn generate_hmac_hex(message: &[u8], key: &[u8]) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SignatureError::InvalidKey)?;

    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Validates a payload against the shared secret, explaining failures.
pub fn validate_auth_payload(payload: &AuthPayload, secret: &str) -> ValidationResult {
    let Some(provided) = payload.hash() else {
        return ValidationResult::invalid("hash field missing");
    };

    let expected = match sign(payload, secret) {
        Ok(sig) => sig,
        Err(err) => return ValidationResult::invalid(err.to_string()),
    };

    if timing_safe_eq(provided, &expected) {
        ValidationResult::valid()
    } else {
        ValidationResult::invalid("signature mismatch")
    }
}

/// Returns true iff the payload's `hash` matches its signature.
///
/// # Example
///
/// ```
/// use remitdesk_api::crypto::{sign, verify, AuthPayload};
///
/// let mut payload = AuthPayload::new();
/// payload.insert("auth_date", "100");
/// let hash = sign(&payload, "bot-secret").unwrap();
/// payload.insert("hash", hash);
///
/// assert!(verify(&payload, "bot-secret"));
/// assert!(!verify(&payload, "other-secret"));
/// ```
pub fn verify(payload: &AuthPayload, secret: &str) -> bool {
    validate_auth_payload(payload, secret).is_valid
}

/// Constant-time string comparison.
///
/// Length is not hidden; both sides are hex digests of fixed length.
fn timing_safe_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (a_byte, b_byte) in a.bytes().zip(b.bytes()) {
        result |= a_byte ^ b_byte;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn reference_signature(secret: &str, message: &str) -> String {
        let mut inner = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        inner.update(secret.as_bytes());
        let key = inner.finalize().into_bytes();

        let mut outer = HmacSha256::new_from_slice(&key).unwrap();
        outer.update(message.as_bytes());
        hex::encode(outer.finalize().into_bytes())
    }

    #[test]
    fn canonical_string_single_field() {
        let payload: AuthPayload = [("auth_date", "100"), ("hash", "abc")].into_iter().collect();
        assert_eq!(payload.canonical_string(), "auth_date=100");
    }

    #[test]
    fn canonical_string_sorts_and_joins_with_newline() {
        let payload: AuthPayload =
            [("username", "bob"), ("auth_date", "100"), ("id", "7"), ("hash", "x")]
                .into_iter()
                .collect();

        assert_eq!(payload.canonical_string(), "auth_date=100\nid=7\nusername=bob");
    }

    #[test]
    fn canonical_string_is_byte_ordered() {
        let payload: AuthPayload = [("b", "1"), ("B", "2"), ("a", "3")].into_iter().collect();
        assert_eq!(payload.canonical_string(), "B=2\na=3\nb=1");
    }

    #[test]
    fn hash_only_payload_has_empty_canonical_string() {
        let payload: AuthPayload = [("hash", "x")].into_iter().collect();
        assert_eq!(payload.canonical_string(), "");
    }

    #[test]
    fn known_vector_for_secret_s() {
        let expected = reference_signature("s", "auth_date=100");
        let payload: AuthPayload =
            [("auth_date", "100"), ("hash", expected.as_str())].into_iter().collect();

        assert_eq!(sign(&payload, "s").unwrap(), expected);
        assert!(verify(&payload, "s"));
    }

    #[test]
    fn signing_key_is_secret_hmaced_with_itself() {
        let key = derive_signing_key("s").unwrap();
        let mut mac = HmacSha256::new_from_slice(b"s").unwrap();
        mac.update(b"s");
        assert_eq!(key, mac.finalize().into_bytes().to_vec());
        assert_eq!(key.len(), 32);
    }

    #[test]
    fn empty_payload_verifies_against_empty_string_signature() {
        let hash = reference_signature("s", "");
        let payload: AuthPayload = [("hash", hash)].into_iter().collect();
        assert!(verify(&payload, "s"));
    }

    #[test]
    fn mutated_field_fails() {
        let mut payload: AuthPayload = [("auth_date", "100")].into_iter().collect();
        let hash = sign(&payload, "s").unwrap();
        payload.insert("hash", hash);
        assert!(verify(&payload, "s"));

        payload.insert("auth_date", "101");
        let result = validate_auth_payload(&payload, "s");
        assert!(!result.is_valid);
        assert_eq!(result.error_message.as_deref(), Some("signature mismatch"));
    }

    #[test]
    fn uppercase_hash_is_rejected() {
        let mut payload: AuthPayload = [("auth_date", "100")].into_iter().collect();
        let hash = sign(&payload, "s").unwrap().to_uppercase();
        payload.insert("hash", hash);
        assert!(!verify(&payload, "s"));
    }

    #[test]
    fn missing_hash_is_rejected() {
        let payload: AuthPayload = [("auth_date", "100")].into_iter().collect();
        let result = validate_auth_payload(&payload, "s");
        assert_eq!(result, ValidationResult::invalid("hash field missing"));
    }

    #[test]
    fn json_values_are_stringified_canonically() {
        assert_eq!(canonical_value(&json!("abc")), "abc");
        assert_eq!(canonical_value(&json!(100)), "100");
        assert_eq!(canonical_value(&json!(1.5)), "1.5");
        assert_eq!(canonical_value(&json!(true)), "true");
        assert_eq!(canonical_value(&json!(null)), "");
        assert_eq!(canonical_value(&json!({"a": 1})), "{\"a\":1}");
    }

    #[test]
    fn numeric_and_string_auth_date_sign_identically() {
        let numeric = json!(1_700_000_000);
        let text = json!("1700000000");

        let a = AuthPayload::from_json_fields([("auth_date", Some(&numeric))]);
        let b = AuthPayload::from_json_fields([("auth_date", Some(&text))]);

        assert_eq!(a.canonical_string(), b.canonical_string());
    }

    #[test]
    fn from_json_fields_skips_absent() {
        let date = json!("5");
        let payload = AuthPayload::from_json_fields([("auth_date", Some(&date)), ("hash", None)]);
        assert_eq!(payload.get("auth_date"), Some("5"));
        assert!(payload.hash().is_none());
    }

    #[test]
    fn timing_safe_eq_behaviour() {
        assert!(timing_safe_eq("hello", "hello"));
        assert!(!timing_safe_eq("hello", "world"));
        assert!(!timing_safe_eq("hello", "hello_world"));
    }
}
