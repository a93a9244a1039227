//! Request/response shapes for the serving dispatcher
//!
//! The scheduled trigger arrives as a push-subscription envelope:
//! `{"message": {"data": base64(JSON {"action": "update_cache"})}}`.

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::cache::HTML_CONTENT_TYPE;
use crate::{Error, Result};

/// Action name that requests a regeneration
pub const UPDATE_CACHE_ACTION: &str = "update_cache";

/// Served when the requested page has never been written
pub const UNAVAILABLE_MESSAGE: &str =
    "Content not yet available. Please check back in a few minutes.";

pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Transport-independent view of an HTTP request
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: String,
    /// Request target, possibly with a query string
    pub path: String,
    pub body: Bytes,
}

impl InboundRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>, body: Bytes) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path, Bytes::new())
    }

    pub fn is_post(&self) -> bool {
        self.method.eq_ignore_ascii_case("POST")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Bytes,
}

impl OutboundResponse {
    pub fn html(body: Bytes) -> Self {
        Self {
            status: 200,
            content_type: HTML_CONTENT_TYPE,
            body,
        }
    }

    pub fn text(status: u16, body: &'static str) -> Self {
        Self {
            status,
            content_type: TEXT_CONTENT_TYPE,
            body: Bytes::from_static(body.as_bytes()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TriggerEnvelope {
    message: PushMessage,
}

#[derive(Debug, Serialize, Deserialize)]
struct PushMessage {
    data: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TriggerCommand {
    action: String,
}

/// Check whether `body` is a well-formed regeneration trigger
pub fn decode_trigger(body: &[u8]) -> Result<()> {
    let envelope: TriggerEnvelope = serde_json::from_slice(body)
        .map_err(|e| Error::Trigger(format!("envelope is not valid JSON: {}", e)))?;

    let data = STANDARD
        .decode(envelope.message.data.trim())
        .map_err(|e| Error::Trigger(format!("message data is not base64: {}", e)))?;

    let command: TriggerCommand = serde_json::from_slice(&data)
        .map_err(|e| Error::Trigger(format!("message data is not a command: {}", e)))?;

    if command.action != UPDATE_CACHE_ACTION {
        return Err(Error::Trigger(format!("unknown action: {}", command.action)));
    }
    Ok(())
}

/// Trigger envelope to configure in the external scheduler
pub fn encode_trigger_payload() -> Result<String> {
    let command = serde_json::to_vec(&TriggerCommand {
        action: UPDATE_CACHE_ACTION.to_string(),
    })?;
    let envelope = TriggerEnvelope {
        message: PushMessage {
            data: STANDARD.encode(command),
        },
    };
    Ok(serde_json::to_string(&envelope)?)
}
