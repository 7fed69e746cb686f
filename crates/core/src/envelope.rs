use serde::Deserialize;
use tracing::warn;

use crate::error::DispatchError;

/// The raw SNS event delivered to the dispatcher.
///
/// Only the fields the dispatcher reads are modeled. Every level is optional
/// so that a missing level is reported as a [`DispatchError::Structural`]
/// naming the level, instead of a generic deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEnvelope {
    #[serde(rename = "Records", default)]
    pub records: Option<Vec<EnvelopeRecord>>,
}

/// One delivered notification inside the envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvelopeRecord {
    #[serde(rename = "Sns", default)]
    pub sns: Option<SnsNotification>,
}

/// The SNS part of a record; `Message` holds the business payload as a JSON
/// string.
#[derive(Debug, Clone, Deserialize)]
pub struct SnsNotification {
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
}

impl NotificationEnvelope {
    /// Interpret a raw invocation event as an SNS envelope.
    ///
    /// The error never quotes values from the event.
    pub fn from_value(event: serde_json::Value) -> Result<Self, DispatchError> {
        serde_json::from_value(event)
            .map_err(|_| DispatchError::Structural("event is not an SNS envelope".to_owned()))
    }

    /// Take the message body of the first record.
    ///
    /// Batching is not supported: if more than one record was delivered, the
    /// extra records are ignored and a warning is emitted.
    pub fn into_message(self) -> Result<String, DispatchError> {
        let records = self
            .records
            .ok_or_else(|| DispatchError::Structural("missing 'Records'".to_owned()))?;

        if records.len() > 1 {
            warn!(
                records = records.len(),
                "envelope carries more than one record, dispatching the first only"
            );
        }

        let record = records
            .into_iter()
            .next()
            .ok_or_else(|| DispatchError::Structural("'Records' is empty".to_owned()))?;

        record
            .sns
            .ok_or_else(|| DispatchError::Structural("record has no 'Sns' section".to_owned()))?
            .message
            .ok_or_else(|| DispatchError::Structural("'Sns' section has no 'Message'".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn message_of(event: serde_json::Value) -> Result<String, DispatchError> {
        NotificationEnvelope::from_value(event)?.into_message()
    }

    #[test]
    fn extracts_first_message() {
        let event = json!({
            "Records": [{ "Sns": { "Message": "{\"url\":\"https://x\"}" } }]
        });
        assert_eq!(message_of(event).unwrap(), r#"{"url":"https://x"}"#);
    }

    #[test]
    fn ignores_unmodeled_sns_fields() {
        let event = json!({
            "Records": [{
                "EventSource": "aws:sns",
                "EventVersion": "1.0",
                "Sns": {
                    "Type": "Notification",
                    "MessageId": "95df01b4-ee98-5cb9-9903-4c221d41eb5e",
                    "TopicArn": "arn:aws:sns:us-east-1:123456789012:recordings",
                    "Message": "{}",
                    "Timestamp": "2024-01-01T00:00:00.000Z"
                }
            }]
        });
        assert_eq!(message_of(event).unwrap(), "{}");
    }

    #[test]
    fn extra_records_are_ignored() {
        let event = json!({
            "Records": [
                { "Sns": { "Message": "first" } },
                { "Sns": { "Message": "second" } }
            ]
        });
        assert_eq!(message_of(event).unwrap(), "first");
    }

    #[test]
    fn empty_records_is_structural() {
        let err = message_of(json!({ "Records": [] })).unwrap_err();
        assert!(matches!(err, DispatchError::Structural(msg) if msg.contains("empty")));
    }

    #[test]
    fn missing_records_is_structural() {
        let err = message_of(json!({})).unwrap_err();
        assert!(matches!(err, DispatchError::Structural(msg) if msg.contains("Records")));
    }

    #[test]
    fn missing_sns_section_is_structural() {
        let err = message_of(json!({ "Records": [{}] })).unwrap_err();
        assert!(matches!(err, DispatchError::Structural(msg) if msg.contains("Sns")));
    }

    #[test]
    fn missing_message_is_structural() {
        let err = message_of(json!({ "Records": [{ "Sns": {} }] })).unwrap_err();
        assert!(matches!(err, DispatchError::Structural(msg) if msg.contains("Message")));
    }

    #[test]
    fn non_object_event_is_structural() {
        let err = message_of(json!("hello")).unwrap_err();
        assert!(matches!(err, DispatchError::Structural(_)));

        let err = message_of(json!({ "Records": "nope" })).unwrap_err();
        assert!(matches!(err, DispatchError::Structural(_)));
    }

    #[test]
    fn non_string_message_is_structural() {
        let err = message_of(json!({ "Records": [{ "Sns": { "Message": { "url": "x" } } }] }))
            .unwrap_err();
        assert!(matches!(err, DispatchError::Structural(_)));
    }

    #[test]
    fn structural_error_does_not_echo_event_values() {
        let err = message_of(json!({ "Records": [{ "Sns": "https://secret.example/board" }] }))
            .unwrap_err();
        assert!(matches!(err, DispatchError::Structural(_)));
        assert!(!err.to_string().contains("secret"));
    }
}
