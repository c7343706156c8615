use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the visitor typed into the payment form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

fn default_currency() -> String {
    "SGD".to_string()
}

impl PaymentRequest {
    pub fn new(name: &str, email: &str, amount: f64, currency: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            amount,
            currency: currency.to_string(),
            purpose: None,
            phone: None,
        }
    }

    /// Local checks only, run before any network call.
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.name.trim().is_empty() {
            return Err(PaymentError::validation("name", "Name is required"));
        }
        if self.email.trim().is_empty() {
            return Err(PaymentError::validation("email", "Email is required"));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(PaymentError::validation(
                "amount",
                "Amount must be a number greater than 0",
            ));
        }
        Ok(())
    }
}

/// A reference number is sent as a single path segment of the status URL.
pub fn check_reference(reference: &str) -> Result<(), PaymentError> {
    let trimmed = reference.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || reference.chars().any(char::is_control)
    {
        return Err(PaymentError::validation(
            "reference_number",
            "Invalid reference number",
        ));
    }
    Ok(())
}

/// Status as reported by the payment API. Values outside the three known
/// ones are kept verbatim so they can be relayed unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentState {
    Pending,
    Completed,
    Failed,
    /// Handled like pending.
    Other(String),
}

impl PaymentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentState::Completed | PaymentState::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Completed => "completed",
            PaymentState::Failed => "failed",
            PaymentState::Other(raw) => raw,
        }
    }
}

impl From<String> for PaymentState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => PaymentState::Pending,
            "completed" => PaymentState::Completed,
            "failed" => PaymentState::Failed,
            _ => PaymentState::Other(raw),
        }
    }
}

impl From<PaymentState> for String {
    fn from(state: PaymentState) -> Self {
        match state {
            PaymentState::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer to a successful create call. The browser is sent to `checkout_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub checkout_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_request_id: Option<String>,
    pub reference_number: String,
    pub status: PaymentState,
}

/// Snapshot of the record held by the payment API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatusRecord {
    pub reference_number: String,
    pub status: PaymentState,
    // decimal amounts come back as strings
    #[serde(deserialize_with = "amount_from_str_or_number")]
    pub amount: String,
    pub currency: String,
    #[serde(deserialize_with = "parse_rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "parse_optional_rfc3339")]
    pub paid_at: Option<DateTime<Utc>>,
}

fn amount_from_str_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "Expected amount as string or number, got: {}",
            other
        ))),
    }
}

fn parse_rfc3339<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&s)
        .map_err(serde::de::Error::custom)
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_optional_rfc3339<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map_err(serde::de::Error::custom)
                .map(|dt| dt.with_timezone(&Utc))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validation_names_the_failing_field() {
        let ok = PaymentRequest::new("A", "a@b.com", 10.0, "SGD");
        assert!(ok.validate().is_ok());

        let cases = [
            (PaymentRequest::new("", "a@b.com", 10.0, "SGD"), "name"),
            (PaymentRequest::new("  ", "a@b.com", 10.0, "SGD"), "name"),
            (PaymentRequest::new("A", "", 10.0, "SGD"), "email"),
            (PaymentRequest::new("A", "a@b.com", 0.0, "SGD"), "amount"),
            (PaymentRequest::new("A", "a@b.com", -5.0, "SGD"), "amount"),
            (PaymentRequest::new("A", "a@b.com", f64::NAN, "SGD"), "amount"),
        ];
        for (request, expected) in cases {
            match request.validate() {
                Err(PaymentError::Validation { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected validation error on {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_form_fields_deserialize_to_invalid_defaults() {
        let request: PaymentRequest = serde_json::from_value(json!({ "name": "A" })).unwrap();
        assert_eq!(request.currency, "SGD");
        assert!(request.validate().is_err());
    }

    #[test]
    fn optional_fields_are_left_out_of_the_body() {
        let body = serde_json::to_value(PaymentRequest::new("A", "a@b.com", 10.0, "SGD")).unwrap();
        assert_eq!(
            body,
            json!({ "name": "A", "email": "a@b.com", "amount": 10.0, "currency": "SGD" })
        );
    }

    #[test]
    fn status_record_accepts_decimal_strings_and_numbers() {
        let record: PaymentStatusRecord = serde_json::from_value(json!({
            "reference_number": "REF-1",
            "status": "completed",
            "amount": "10.00",
            "currency": "SGD",
            "created_at": "2025-03-01T10:00:00.123456Z",
            "paid_at": "2025-03-01T10:02:00+08:00"
        }))
        .unwrap();
        assert_eq!(record.amount, "10.00");
        assert_eq!(record.status, PaymentState::Completed);
        assert_eq!(
            record.paid_at.unwrap().to_rfc3339(),
            "2025-03-01T02:02:00+00:00"
        );

        let record: PaymentStatusRecord = serde_json::from_value(json!({
            "reference_number": "REF-2",
            "status": "refunded",
            "amount": 12.5,
            "currency": "SGD",
            "created_at": "2025-03-01T10:00:00Z",
            "paid_at": null
        }))
        .unwrap();
        assert_eq!(record.amount, "12.5");
        assert_eq!(record.status, PaymentState::Other("refunded".to_string()));
        assert!(!record.status.is_terminal());
        assert_eq!(record.paid_at, None);
    }

    #[test]
    fn dot_segments_and_blank_references_are_refused() {
        for reference in ["", "  ", ".", "..", " .. ", "REF\n1"] {
            assert!(
                matches!(
                    check_reference(reference),
                    Err(PaymentError::Validation { field: "reference_number", .. })
                ),
                "{reference:?} accepted"
            );
        }
        for reference in ["REF-1", "../../reviews", "a/b", "REF?x=1"] {
            assert!(check_reference(reference).is_ok(), "{reference:?} refused");
        }
    }

    #[test]
    fn unrecognised_statuses_are_relayed_unchanged() {
        let upstream = json!({
            "checkout_url": "https://x",
            "reference_number": "REF-3",
            "status": "active"
        });
        let response: PaymentResponse = serde_json::from_value(upstream.clone()).unwrap();
        assert_eq!(response.status, PaymentState::Other("active".to_string()));
        assert_eq!(serde_json::to_value(&response).unwrap(), upstream);

        let known: PaymentState = serde_json::from_value(json!("completed")).unwrap();
        assert_eq!(known, PaymentState::Completed);
        assert_eq!(serde_json::to_value(known).unwrap(), json!("completed"));
    }
}
