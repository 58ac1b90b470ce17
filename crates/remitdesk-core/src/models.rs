//! Domain models for submitted requests.
//!
//! A request moves through three shapes: [`NewRequest`] is what a caller
//! submits, [`StoredRequest`] is the full database row including the
//! `creator` attribution column, and [`Request`] is the redacted view that
//! leaves the storage boundary. Only `Request` is serializable, so a stored
//! row cannot be sent to a client without going through [`StoredRequest::redact`].

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use thiserror::Error;

type PgDb = sqlx::Postgres;
type PgValueRef<'r> = sqlx::postgres::PgValueRef<'r>;
type PgTypeInfo = sqlx::postgres::PgTypeInfo;
type PgArgumentBuffer = sqlx::postgres::PgArgumentBuffer;
type EncodeResult =
    Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync + 'static>>;
type BoxDynError = sqlx::error::BoxDynError;

/// Placeholder used in human-readable output for absent fields.
const MISSING: &str = "-";

/// Strongly-typed request identifier.
///
/// Assigned by the database at insert time and never reassigned.
///
/// # Example
///
/// ```
/// use remitdesk_core::models::RequestId;
///
/// let id: RequestId = "42".parse().unwrap();
/// assert_eq!(id, RequestId(42));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub i64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for RequestId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl sqlx::Type<PgDb> for RequestId {
    fn type_info() -> PgTypeInfo {
        <i64 as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for RequestId {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let id = <i64 as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(Self(id))
    }
}

impl sqlx::Encode<'_, PgDb> for RequestId {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <i64 as sqlx::Encode<PgDb>>::encode_by_ref(&self.0, buf)
    }
}

/// Monetary amount, kept as its exact decimal text.
///
/// Stored in a `NUMERIC` column, so any precision the caller sends survives.
/// Accepts a JSON number or a numeric string. Serializes as a JSON number when
/// one represents the text exactly, otherwise as a decimal string.
///
/// # Example
///
/// ```
/// use remitdesk_core::models::Amount;
///
/// let amount: Amount = "12345678901234567".parse().unwrap();
/// assert_eq!(serde_json::to_string(&amount).unwrap(), "12345678901234567");
///
/// let amount: Amount = "1500.00".parse().unwrap();
/// assert_eq!(serde_json::to_string(&amount).unwrap(), "\"1500.00\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Amount(String);

/// Text that is not a decimal number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal amount: {0:?}")]
pub struct InvalidAmount(pub String);

impl Amount {
    /// The decimal text as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The JSON number equal to this amount, if one exists.
    fn exact_number(&self) -> Option<Number> {
        if let Ok(n) = self.0.parse::<i64>() {
            return Some(n.into());
        }
        if let Ok(n) = self.0.parse::<u64>() {
            return Some(n.into());
        }
        let n = Number::from_f64(self.0.parse::<f64>().ok()?)?;
        let exact = n.to_string() == self.0 || n.as_f64().is_some_and(|f| f.to_string() == self.0);
        exact.then_some(n)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Amount {
    type Err = InvalidAmount;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if is_decimal(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidAmount(s.to_string()))
        }
    }
}

impl From<i64> for Amount {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.exact_number() {
            Some(n) => n.serialize(serializer),
            None => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            // Integers keep every digit; floats keep their shortest exact form.
            Value::Number(n) => Ok(Self(n.to_string())),
            Value::String(s) => s.parse().map_err(de::Error::custom),
            other => Err(de::Error::custom(format!(
                "amount must be a number or numeric string, got {other}"
            ))),
        }
    }
}

impl sqlx::Type<PgDb> for Amount {
    fn type_info() -> PgTypeInfo {
        <String as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for Amount {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let text = <String as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(Self(text))
    }
}

impl sqlx::Encode<'_, PgDb> for Amount {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <String as sqlx::Encode<PgDb>>::encode_by_ref(&self.0, buf)
    }
}

/// Decimal literal as `NUMERIC` accepts it: sign, digits, point, exponent.
fn is_decimal(s: &str) -> bool {
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());

    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(at) => (&unsigned[..at], Some(&unsigned[at + 1..])),
        None => (unsigned, None),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    if (int.is_empty() && frac.is_empty()) || !digits(int) || !digits(frac) {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !exp.is_empty() && digits(exp)
        },
    }
}

/// Reads a text column from any JSON scalar.
///
/// Strings pass through; numbers and booleans keep their JSON spelling;
/// arrays and objects become compact JSON.
fn text_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Caller-supplied fields of a request.
///
/// Every field is optional and stored verbatim. No validation happens beyond
/// what the column types enforce.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewRequest {
    /// Category label chosen by the caller.
    #[serde(default, deserialize_with = "text_field")]
    pub request_type: Option<String>,
    /// Destination country; may be a structured value.
    #[serde(default)]
    pub country: Option<Value>,
    /// Currency code or name.
    #[serde(default, deserialize_with = "text_field")]
    pub currency: Option<String>,
    /// Amount in the given currency.
    #[serde(default)]
    pub amount: Option<Amount>,
    /// Bank handling the transfer.
    #[serde(default, deserialize_with = "text_field")]
    pub bank: Option<String>,
    /// Description of the traded item.
    #[serde(default, deserialize_with = "text_field")]
    pub goods: Option<String>,
    /// Free-form attributes.
    #[serde(default)]
    pub features: Option<Value>,
}

impl NewRequest {
    /// Renders the human-readable confirmation sent to the requester.
    pub fn summary(&self) -> String {
        let text = |v: &Option<String>| v.as_deref().unwrap_or(MISSING).to_string();

        let country = self.country.as_ref().map_or_else(|| MISSING.to_string(), Value::to_string);
        let amount = self.amount.as_ref().map_or_else(|| MISSING.to_string(), Amount::to_string);
        let features = match &self.features {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => MISSING.to_string(),
        };

        format!(
            "Your request has been submitted:\nRequest type: {}\nCountry: {}\nCurrency: {}\n\
             Amount: {}\nBank: {}\nGoods: {}\nFeatures: {}",
            text(&self.request_type),
            country,
            text(&self.currency),
            amount,
            text(&self.bank),
            text(&self.goods),
            features,
        )
    }
}

/// A persisted request as returned to clients.
///
/// This is the redacted view: the `creator` attribution column never appears
/// here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Server-assigned identifier.
    pub id: RequestId,
    /// Category label chosen by the caller.
    pub request_type: Option<String>,
    /// Destination country; may be a structured value.
    pub country: Option<Value>,
    /// Currency code or name.
    pub currency: Option<String>,
    /// Amount in the given currency.
    pub amount: Option<Amount>,
    /// Bank handling the transfer.
    pub bank: Option<String>,
    /// Description of the traded item.
    pub goods: Option<String>,
    /// Free-form attributes.
    pub features: Option<Value>,
    /// When the row was inserted.
    pub created_at: DateTime<Utc>,
}

impl Request {
    /// Returns the caller-supplied portion of this request.
    pub fn fields(&self) -> NewRequest {
        NewRequest {
            request_type: self.request_type.clone(),
            country: self.country.clone(),
            currency: self.currency.clone(),
            amount: self.amount.clone(),
            bank: self.bank.clone(),
            goods: self.goods.clone(),
            features: self.features.clone(),
        }
    }
}

/// Full `requests` row, including storage-only columns.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredRequest {
    /// Server-assigned identifier.
    pub id: RequestId,
    /// Category label chosen by the caller.
    pub request_type: Option<String>,
    /// Destination country.
    pub country: Option<Value>,
    /// Currency code or name.
    pub currency: Option<String>,
    /// Amount in the given currency.
    pub amount: Option<Amount>,
    /// Bank handling the transfer.
    pub bank: Option<String>,
    /// Description of the traded item.
    pub goods: Option<String>,
    /// Free-form attributes.
    pub features: Option<Value>,
    /// Attribution populated by the database, never exposed.
    pub creator: Option<String>,
    /// When the row was inserted.
    pub created_at: DateTime<Utc>,
}

impl StoredRequest {
    /// Drops storage-only columns, producing the client-facing view.
    pub fn redact(self) -> Request {
        let Self {
            id,
            request_type,
            country,
            currency,
            amount,
            bank,
            goods,
            features,
            creator: _,
            created_at,
        } = self;

        Request { id, request_type, country, currency, amount, bank, goods, features, created_at }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn stored() -> StoredRequest {
        StoredRequest {
            id: RequestId(7),
            request_type: Some("import".into()),
            country: Some(json!({"code": "CN", "name": "China"})),
            currency: Some("USD".into()),
            amount: Some("1500.5".parse().unwrap()),
            bank: Some("Alfa".into()),
            goods: Some("electronics".into()),
            features: Some(json!("urgent")),
            creator: Some("backoffice".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn redaction_removes_creator_key() {
        let json = serde_json::to_value(stored().redact()).unwrap();

        assert!(json.get("creator").is_none());
        assert_eq!(json["id"], 7);
        assert_eq!(json["country"]["code"], "CN");
    }

    #[test]
    fn redaction_keeps_caller_fields() {
        let row = stored();
        let request = row.clone().redact();

        assert_eq!(request.fields(), NewRequest {
            request_type: row.request_type,
            country: row.country,
            currency: row.currency,
            amount: row.amount,
            bank: row.bank,
            goods: row.goods,
            features: row.features,
        });
    }

    #[test]
    fn request_id_parses_decimal() {
        assert_eq!("15".parse::<RequestId>().unwrap(), RequestId(15));
        assert!("abc".parse::<RequestId>().is_err());
        assert!("1.5".parse::<RequestId>().is_err());
    }

    #[test]
    fn request_id_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&RequestId(3)).unwrap(), "3");
    }

    #[test]
    fn new_request_accepts_missing_fields() {
        let request: NewRequest = serde_json::from_value(json!({"currency": "EUR"})).unwrap();

        assert_eq!(request.currency.as_deref(), Some("EUR"));
        assert!(request.amount.is_none());
        assert!(request.country.is_none());
    }

    #[test]
    fn amount_keeps_integers_beyond_f64_precision() {
        let request: NewRequest =
            serde_json::from_str(r#"{"amount": 12345678901234567}"#).unwrap();
        let amount = request.amount.unwrap();

        assert_eq!(amount.as_str(), "12345678901234567");
        assert_eq!(serde_json::to_string(&amount).unwrap(), "12345678901234567");
    }

    #[test]
    fn amount_accepts_numeric_strings() {
        let request: NewRequest = serde_json::from_value(json!({"amount": "1500"})).unwrap();
        assert_eq!(request.amount, Some(Amount::from(1500)));

        let request: NewRequest = serde_json::from_value(json!({"amount": " 0.10 "})).unwrap();
        assert_eq!(request.amount.unwrap().as_str(), "0.10");
    }

    #[test]
    fn amount_rejects_non_numeric_values() {
        for bad in [json!("12abc"), json!(""), json!("."), json!("1e"), json!(true), json!([1])] {
            let result = serde_json::from_value::<NewRequest>(json!({"amount": bad}));
            assert!(result.is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn amount_serializes_inexact_text_as_string() {
        let amount: Amount = "0.1000000000000000000001".parse().unwrap();
        assert_eq!(serde_json::to_value(&amount).unwrap(), json!("0.1000000000000000000001"));

        let amount: Amount = "2500.5".parse().unwrap();
        assert_eq!(serde_json::to_value(&amount).unwrap(), json!(2500.5));

        let amount: Amount = "-3e2".parse().unwrap();
        assert_eq!(amount.as_str(), "-3e2");
    }

    #[test]
    fn text_fields_accept_any_scalar() {
        let request: NewRequest = serde_json::from_value(json!({
            "currency": 840,
            "bank": true,
            "goods": null,
            "request_type": ["a", "b"]
        }))
        .unwrap();

        assert_eq!(request.currency.as_deref(), Some("840"));
        assert_eq!(request.bank.as_deref(), Some("true"));
        assert!(request.goods.is_none());
        assert_eq!(request.request_type.as_deref(), Some(r#"["a","b"]"#));
    }

    #[test]
    fn summary_renders_structured_country_as_json() {
        let request = NewRequest {
            request_type: Some("export".into()),
            country: Some(json!({"code": "AE"})),
            currency: Some("AED".into()),
            amount: Some(Amount::from(250)),
            bank: Some("Tinkoff".into()),
            goods: Some("steel".into()),
            features: Some(json!("fragile")),
        };

        let summary = request.summary();

        assert!(summary.starts_with("Your request has been submitted:\n"));
        assert!(summary.contains("Country: {\"code\":\"AE\"}"));
        assert!(summary.contains("Amount: 250\n"));
        assert!(summary.ends_with("Features: fragile"));
    }

    #[test]
    fn summary_marks_absent_fields() {
        let summary = NewRequest::default().summary();

        assert!(summary.contains("Request type: -"));
        assert!(summary.contains("Amount: -"));
        assert!(summary.contains("Features: -"));
    }
}
