//! Append-only deployment event log.
//!
//! Events are observation only; nothing in the run reads them back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_signature::Signature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

/// One line of deployment progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentEvent {
    /// Starts at 1, strictly increasing within a run.
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub level: EventLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

/// Optional fields attached to an event.
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    pub offset: Option<u32>,
    pub transaction_hash: Option<Signature>,
    pub explorer_url: Option<String>,
}

impl EventContext {
    pub fn at_offset(offset: Option<u32>) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    pub fn with_transaction(mut self, signature: Signature, explorer_url: String) -> Self {
        self.transaction_hash = Some(signature);
        self.explorer_url = Some(explorer_url);
        self
    }

    pub fn with_explorer_url(mut self, explorer_url: String) -> Self {
        self.explorer_url = Some(explorer_url);
        self
    }
}

#[derive(Debug, Default)]
pub struct DeploymentLog {
    events: Vec<DeploymentEvent>,
}

impl DeploymentLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and mirror it to `tracing`.
    pub fn record(
        &mut self,
        level: EventLevel,
        message: impl Into<String>,
        context: EventContext,
    ) -> &DeploymentEvent {
        let event = DeploymentEvent {
            sequence: self.events.len() as u64 + 1,
            timestamp: Utc::now(),
            level,
            message: message.into(),
            offset: context.offset,
            transaction_hash: context.transaction_hash,
            explorer_url: context.explorer_url,
        };

        let signature = event.transaction_hash.map(|s| s.to_string());
        match level {
            EventLevel::Info => tracing::info!(
                sequence = event.sequence,
                offset = ?event.offset,
                signature = ?signature,
                "{}",
                event.message
            ),
            EventLevel::Warn => tracing::warn!(
                sequence = event.sequence,
                offset = ?event.offset,
                signature = ?signature,
                "{}",
                event.message
            ),
            EventLevel::Error => tracing::error!(
                sequence = event.sequence,
                offset = ?event.offset,
                signature = ?signature,
                "{}",
                event.message
            ),
        }

        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    pub fn events(&self) -> &[DeploymentEvent] {
        &self.events
    }

    /// Events after the first `count`.
    pub fn skip(&self, count: usize) -> &[DeploymentEvent] {
        &self.events[count.min(self.events.len())..]
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<DeploymentEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let mut log = DeploymentLog::new();
        log.record(EventLevel::Info, "one", EventContext::default());
        log.record(EventLevel::Warn, "two", EventContext::at_offset(Some(900)));
        log.record(EventLevel::Error, "three", EventContext::default());

        let seqs: Vec<u64> = log.events().iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(log.skip(2).len(), 1);
        assert!(log.skip(10).is_empty());
    }

    #[test]
    fn test_event_serialization_omits_empty_fields() {
        let mut log = DeploymentLog::new();
        let event = log
            .record(EventLevel::Info, "confirmed", EventContext::default())
            .clone();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["level"], "info");
        assert!(json.get("transaction_hash").is_none());
        assert!(json.get("explorer_url").is_none());
    }

    #[test]
    fn test_transaction_context_round_trips() {
        let mut log = DeploymentLog::new();
        let sig = Signature::from([3u8; 64]);
        let ctx = EventContext::at_offset(Some(0)).with_transaction(sig, "https://x/tx".into());
        let event = log.record(EventLevel::Info, "submitted", ctx).clone();

        let json = serde_json::to_string(&event).unwrap();
        let back: DeploymentEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
