use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// Response of a successful call.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientResponse {
    /// Decoded response payload: JSON when the body parses as JSON,
    /// otherwise the raw body as a string, `Null` for an empty body.
    pub data: JsonValue,
    pub status: u16,
    pub status_text: String,
}

impl ClientResponse {
    pub(crate) fn from_body(status: u16, status_text: String, body: String) -> Self {
        Self {
            data: decode_body(body),
            status,
            status_text,
        }
    }

    /// Deserializes the response payload into a typed value.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.data.clone())
    }
}

fn decode_body(body: String) -> JsonValue {
    if body.is_empty() {
        return JsonValue::Null;
    }
    serde_json::from_str(&body).unwrap_or_else(|_| JsonValue::String(body))
}

/// Terminal result of one logical call.
///
/// `Absorbed` is the explicit fire-and-forget mode: it is produced only by
/// clients configured with `absorb_failures` after a terminal failure was
/// reported through the tracker's `fail` hook. Clients without that flag
/// never observe it.
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub enum CallOutcome {
    /// The call completed and the server's response is available.
    Response(ClientResponse),
    /// The call failed terminally and the failure was swallowed.
    Absorbed,
}

impl CallOutcome {
    pub fn into_response(self) -> Option<ClientResponse> {
        match self {
            Self::Response(response) => Some(response),
            Self::Absorbed => None,
        }
    }

    pub fn is_absorbed(&self) -> bool {
        matches!(self, Self::Absorbed)
    }
}
