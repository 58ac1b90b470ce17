//! Builders for submission bodies and request fields.

use remitdesk_api::crypto::{sign, AuthPayload};
use remitdesk_core::{Amount, NewRequest};
use serde_json::{json, Map, Value};

/// Builder for `POST /submit` bodies.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    request: NewRequest,
    user_id: Option<Value>,
    auth_date: Option<Value>,
    hash: Option<String>,
}

impl RequestBuilder {
    /// Creates a builder with every field absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with a realistic, fully populated request.
    pub fn with_defaults() -> Self {
        Self {
            request: NewRequest {
                request_type: Some("import".to_string()),
                country: Some(json!({"code": "CN", "name": "China"})),
                currency: Some("USD".to_string()),
                amount: Some(Amount::from(15_000)),
                bank: Some("Tinkoff".to_string()),
                goods: Some("electronics".to_string()),
                features: Some(json!({"urgent": true})),
            },
            user_id: Some(json!(424_242)),
            auth_date: None,
            hash: None,
        }
    }

    /// Sets the request type.
    #[must_use]
    pub fn request_type(mut self, value: impl Into<String>) -> Self {
        self.request.request_type = Some(value.into());
        self
    }

    /// Sets the country.
    #[must_use]
    pub fn country(mut self, value: Value) -> Self {
        self.request.country = Some(value);
        self
    }

    /// Sets the amount.
    #[must_use]
    pub fn amount(mut self, value: Amount) -> Self {
        self.request.amount = Some(value);
        self
    }

    /// Sets the goods description.
    #[must_use]
    pub fn goods(mut self, value: impl Into<String>) -> Self {
        self.request.goods = Some(value.into());
        self
    }

    /// Sets the features value.
    #[must_use]
    pub fn features(mut self, value: Value) -> Self {
        self.request.features = Some(value);
        self
    }

    /// Sets the notification recipient.
    #[must_use]
    pub fn user_id(mut self, value: Value) -> Self {
        self.user_id = Some(value);
        self
    }

    /// Drops the notification recipient.
    #[must_use]
    pub fn without_user_id(mut self) -> Self {
        self.user_id = None;
        self
    }

    /// Sets `auth_date` and a `hash` valid for `secret`.
    ///
    /// # Panics
    ///
    /// Panics if signing fails, which only happens for a rejected HMAC key.
    #[must_use]
    pub fn signed(mut self, auth_date: i64, secret: &str) -> Self {
        let date = json!(auth_date);
        let payload = AuthPayload::from_json_fields([("auth_date", Some(&date))]);
        self.hash = Some(sign(&payload, secret).expect("signing with test secret"));
        self.auth_date = Some(date);
        self
    }

    /// Sets `auth_date` and an arbitrary `hash`.
    #[must_use]
    pub fn with_hash(mut self, auth_date: i64, hash: impl Into<String>) -> Self {
        self.auth_date = Some(json!(auth_date));
        self.hash = Some(hash.into());
        self
    }

    /// The fields that get persisted.
    pub fn request(&self) -> NewRequest {
        self.request.clone()
    }

    /// The JSON body to post.
    pub fn build(&self) -> Value {
        let mut body = match serde_json::to_value(&self.request) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        if let Some(user_id) = &self.user_id {
            body.insert("user_id".to_string(), user_id.clone());
        }
        if let Some(auth_date) = &self.auth_date {
            body.insert("auth_date".to_string(), auth_date.clone());
        }
        if let Some(hash) = &self.hash {
            body.insert("hash".to_string(), Value::String(hash.clone()));
        }
        Value::Object(body)
    }
}
