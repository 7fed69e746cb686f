use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, ValidationError};

/// Which business message a deployment variant accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadSchema {
    /// `{"url": "..."}`
    Url,
    /// `{"url": "...", "fileName": "..."}`
    UrlWithFileName,
}

impl PayloadSchema {
    /// Fields that must be present and non-empty, in reporting order.
    pub fn required_fields(self) -> &'static [PayloadField] {
        match self {
            Self::Url => &[PayloadField::Url],
            Self::UrlWithFileName => &[PayloadField::Url, PayloadField::FileName],
        }
    }
}

/// A named field of the business message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PayloadField {
    Url,
    FileName,
}

impl PayloadField {
    /// The JSON key used in the message body.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::FileName => "fileName",
        }
    }
}

impl fmt::Display for PayloadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// The decoded and validated business message.
#[derive(Clone, PartialEq, Eq)]
pub struct DispatchPayload {
    url: String,
    file_name: Option<String>,
}

// URLs and file names may carry meeting tokens; keep them out of logs.
impl fmt::Debug for DispatchPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchPayload")
            .field("url", &"[REDACTED]")
            .field("file_name", &self.file_name.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl DispatchPayload {
    /// Decode a message body and validate it against `schema`.
    ///
    /// The body must be a JSON object. Every field the schema requires must be
    /// a string with non-whitespace content; all offending fields are reported
    /// together. Fields the schema does not require are ignored.
    pub fn parse(message: &str, schema: PayloadSchema) -> Result<Self, DispatchError> {
        let body: serde_json::Value =
            serde_json::from_str(message).map_err(|e| DispatchError::Parse(e.to_string()))?;
        let fields = match body {
            serde_json::Value::Object(fields) => fields,
            other => {
                return Err(DispatchError::Parse(format!(
                    "expected a JSON object, got {}",
                    json_type_name(&other)
                )));
            }
        };

        let required = schema.required_fields();
        let mut missing = Vec::new();
        let mut take = |field: PayloadField| -> Option<String> {
            let value = fields
                .get(field.wire_name())
                .and_then(serde_json::Value::as_str)
                .filter(|v| !v.trim().is_empty())
                .map(str::to_owned);
            if value.is_none() && required.contains(&field) {
                missing.push(field);
            }
            value
        };

        let url = take(PayloadField::Url);
        let file_name = if required.contains(&PayloadField::FileName) {
            take(PayloadField::FileName)
        } else {
            None
        };

        match url {
            Some(url) if missing.is_empty() => Ok(Self { url, file_name }),
            _ => Err(ValidationError::new(missing).into()),
        }
    }

    /// The target URL, passed to the task as `URL`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The file name, passed as `FILENAME`. Always `None` for the URL-only
    /// schema.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
