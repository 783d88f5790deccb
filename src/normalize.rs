//! Agency response normalization.
//!
//! The pipeline answers Legal and Design runs with differently shaped JSON.
//! [`AgencyResult`] tags a raw payload with the agency that produced it and
//! each variant renders itself into the single display string stored in the
//! transcript. Unexpected shapes never fail: every payload renders to *some*
//! string.
//!
//! Legal precedence, first match wins:
//!
//! 1. `output.document` (with a `**Risk Score:**` header line),
//! 2. `output` when it is a string,
//! 3. pretty JSON of `output.output`, else of `output`,
//! 4. the last element of `messages` when step 3 produced an empty rendering.
//!
//! Design renders pretty JSON of `output`, prefixed with the generated image
//! URL when `output.artifacts.image.url` is set.

use agency_api::Agency;
use serde::Deserialize;
use serde_json::{Map, Value};

pub const ERROR_RUNNING_AGENCY: &str = "Error running agency.";
pub const REQUEST_FAILED: &str = "Request failed.";
pub const RISK_SCORE_PLACEHOLDER: &str = "N/A";

const SUCCESS_STATUS: &str = "success";

/// Fields of the run-agency response the client reads. Everything is
/// optional; absent fields decode as `null`.
#[derive(Debug, Default, Deserialize)]
struct RunAgencyEnvelope {
    #[serde(default)]
    status: Value,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    metrics: Value,
    #[serde(default)]
    messages: Value,
}

impl RunAgencyEnvelope {
    fn succeeded(&self) -> bool {
        self.status.as_str() == Some(SUCCESS_STATUS)
    }

    /// `output`, with a missing value read as an empty object.
    fn take_output(&mut self) -> Value {
        match self.output.take() {
            Value::Null => Value::Object(Map::new()),
            output => output,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgencyResult {
    Legal(LegalResult),
    Design(DesignResult),
    /// The backend answered with a status other than `"success"`.
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegalResult {
    document: Option<String>,
    risk_score: Option<Value>,
    output: Value,
    messages: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesignResult {
    image_url: Option<String>,
    output: Value,
}

impl AgencyResult {
    /// Tag a raw payload with the agency that was asked.
    pub fn from_payload(agency: Agency, payload: Value) -> Self {
        if !payload.is_object() {
            return Self::Failed;
        }
        let Ok(mut envelope) = serde_json::from_value::<RunAgencyEnvelope>(payload) else {
            return Self::Failed;
        };
        if !envelope.succeeded() {
            return Self::Failed;
        }

        match agency {
            Agency::Legal => Self::Legal(LegalResult::from_envelope(envelope)),
            Agency::Design => Self::Design(DesignResult::from_envelope(envelope)),
        }
    }

    pub fn display_text(&self) -> String {
        match self {
            Self::Legal(result) => result.display_text(),
            Self::Design(result) => result.display_text(),
            Self::Failed => ERROR_RUNNING_AGENCY.to_owned(),
        }
    }
}

impl LegalResult {
    fn from_envelope(mut envelope: RunAgencyEnvelope) -> Self {
        let output = envelope.take_output();
        let document = output
            .get("document")
            .and_then(Value::as_str)
            .filter(|document| !document.is_empty())
            .map(str::to_owned);
        let risk_score = envelope
            .metrics
            .get("risk_score")
            .filter(|score| !score.is_null())
            .cloned();
        let messages = match envelope.messages {
            Value::Array(messages) => messages,
            _ => Vec::new(),
        };

        Self {
            document,
            risk_score,
            output,
            messages,
        }
    }

    pub fn display_text(&self) -> String {
        if let Some(document) = &self.document {
            return format!("**Risk Score:** {}/100\n\n{document}", self.risk_score_text());
        }

        let fallback = match &self.output {
            Value::String(text) => text.clone(),
            output => {
                let nested = output.get("output").filter(|nested| is_truthy(nested));
                pretty_json(nested.unwrap_or(output))
            }
        };

        if is_semantically_empty(&fallback) {
            if let Some(last) = self.messages.last() {
                return value_text(last);
            }
        }
        fallback
    }

    fn risk_score_text(&self) -> String {
        match &self.risk_score {
            Some(Value::String(score)) if !score.is_empty() => score.clone(),
            Some(Value::String(_)) | Some(Value::Null) | None => RISK_SCORE_PLACEHOLDER.to_owned(),
            Some(score) => integral_floats_as_integers(score.clone()).to_string(),
        }
    }
}

impl DesignResult {
    fn from_envelope(mut envelope: RunAgencyEnvelope) -> Self {
        let output = envelope.take_output();
        let image_url = output
            .pointer("/artifacts/image/url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_owned);

        Self { image_url, output }
    }

    pub fn display_text(&self) -> String {
        let rendered = pretty_json(&self.output);
        match &self.image_url {
            Some(url) => format!("Generated Image: {url}\n\n{rendered}"),
            None => rendered,
        }
    }
}

/// Two-space indented JSON, keys in backend order.
fn pretty_json(value: &Value) -> String {
    let value = integral_floats_as_integers(value.clone());
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}

/// Largest float that still converts to an integer exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Rewrites floats without a fractional part as integers so the pipeline's
/// `1.0` reads as `1`.
fn integral_floats_as_integers(value: Value) -> Value {
    match value {
        Value::Number(number) if number.is_f64() => match number.as_f64() {
            Some(float) if float.fract() == 0.0 && float.abs() <= MAX_EXACT_INTEGER => {
                Value::from(float as i64)
            }
            _ => Value::Number(number),
        },
        Value::Array(items) => {
            Value::Array(items.into_iter().map(integral_floats_as_integers).collect())
        }
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, field)| (key, integral_floats_as_integers(field)))
                .collect(),
        ),
        other => other,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => pretty_json(other),
    }
}

fn is_semantically_empty(rendered: &str) -> bool {
    matches!(rendered, "" | "{}" | "[]")
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn truthiness_rules() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!(0.5)));
        assert!(is_truthy(&json!("x")));
    }

    #[test]
    fn empty_renderings() {
        for rendered in ["", "{}", "[]"] {
            assert!(is_semantically_empty(rendered), "{rendered:?}");
        }
        for rendered in ["  ", "null", " {}", "{\n  \"a\": 1\n}"] {
            assert!(!is_semantically_empty(rendered), "{rendered:?}");
        }
    }

    #[test]
    fn integral_floats_lose_their_fraction() {
        assert_eq!(
            integral_floats_as_integers(json!({"a": 1.0, "b": [2.0, 2.5], "c": -0.0, "d": 3})),
            json!({"a": 1, "b": [2, 2.5], "c": 0, "d": 3})
        );
        assert_eq!(integral_floats_as_integers(json!(1e300)), json!(1e300));
    }

    #[test]
    fn non_object_payload_is_a_failed_run() {
        assert_eq!(
            AgencyResult::from_payload(Agency::Legal, json!("success")),
            AgencyResult::Failed
        );
        assert_eq!(
            AgencyResult::from_payload(Agency::Design, json!([1, 2])),
            AgencyResult::Failed
        );
    }
}
