//! Relay wire protocol.
//!
//! The relay pushes JSON text frames to every connected subscriber. Clients
//! never need to send application messages.
//!
//! # Protocol
//!
//! 1. Right after the upgrade the relay sends a
//!    [`RelayMessage::ConnectionStatus`] acknowledgment.
//! 2. New funds are delivered in [`RelayMessage::BatchUpdate`] frames, at
//!    most one per broadcast interval.
//! 3. A lone [`RelayMessage::NewFund`] frame is still understood by clients
//!    for relays that do not batch.
//!
//! Events that arrived before a subscriber connected are not replayed.

use serde::{Deserialize, Serialize};

use super::fund::FundEvent;

/// Relay-to-client message.
///
/// Serialized as an internally-tagged JSON object:
///
/// ```json
/// {"type":"connection_status","data":{"connected":true}}
/// {"type":"new_fund","data":{"owner":"0x..","address":"0x..","name":"Trees","goal":"100.0"}}
/// {"type":"batch_update","updates":[{"type":"new_fund","data":{ ... }}]}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayMessage {
    /// Acknowledgment sent once to every new subscriber.
    ConnectionStatus { data: ConnectionStatus },

    /// A single fund creation event.
    NewFund { data: FundEvent },

    /// Several events coalesced into one frame, in the order the relay
    /// received them.
    BatchUpdate { updates: Vec<RelayUpdate> },

    /// Any message type this version does not know about.
    #[serde(other, skip_serializing)]
    Unrecognized,
}

/// A single event carried inside a [`RelayMessage::BatchUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayUpdate {
    NewFund { data: FundEvent },

    #[serde(other, skip_serializing)]
    Unrecognized,
}

/// Payload of [`RelayMessage::ConnectionStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
}

impl RelayMessage {
    /// The acknowledgment every subscriber receives on connect.
    pub fn connected() -> Self {
        RelayMessage::ConnectionStatus {
            data: ConnectionStatus { connected: true },
        }
    }

    /// Wrap a sequence of events into one batch frame, preserving order.
    pub fn batch(events: impl IntoIterator<Item = FundEvent>) -> Self {
        RelayMessage::BatchUpdate {
            updates: events
                .into_iter()
                .map(|data| RelayUpdate::NewFund { data })
                .collect(),
        }
    }
}
