//! The `(status, body)` envelope every client operation returns.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::types::{Pet, PetList};

/// Response payload: parsed JSON when possible, the raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Raw(String),
}

/// Status code plus body of a completed request.
///
/// A failure status is not an error: callers assert on `status`. No shape
/// is guaranteed for the body when the status indicates failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Raw(_) => None,
        }
    }

    /// Top-level field of a JSON object body.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.json()?.as_object()?.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name)?.as_str()
    }

    /// The auth key issued by a successful authenticate call.
    pub fn api_key(&self) -> Result<&str, ApiError> {
        self.str_field("key")
            .ok_or_else(|| self.unexpected("no string `key` field"))
    }

    /// The `pets` array of a listing response.
    pub fn pets(&self) -> Result<Vec<Pet>, ApiError> {
        Ok(self.decode::<PetList>()?.pets)
    }

    /// A single pet record, as echoed by create and update calls.
    pub fn pet(&self) -> Result<Pet, ApiError> {
        self.decode()
    }

    fn decode<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let value = self.json().ok_or_else(|| self.unexpected("body is not JSON"))?;
        T::deserialize(value).map_err(|e| self.unexpected(&e.to_string()))
    }

    fn unexpected(&self, reason: &str) -> ApiError {
        ApiError::UnexpectedBody {
            status: self.status,
            reason: reason.to_string(),
        }
    }
}
