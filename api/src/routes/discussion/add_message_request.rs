use review_engine::MessageInput;
use review_store::SenderRole;
use serde::Deserialize;

/// Request body for posting one discussion message.
#[derive(Debug, Deserialize)]
pub struct AddMessageRequest {
    pub review_id: String,
    pub sender_role: SenderRole,
    pub body: String,
    /// Opaque metadata; a JSON object is stored serialized, a string as-is.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl From<AddMessageRequest> for MessageInput {
    fn from(r: AddMessageRequest) -> Self {
        let metadata = r.metadata.map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
        MessageInput {
            review_id: r.review_id,
            sender_role: r.sender_role,
            body: r.body,
            metadata,
        }
    }
}
