//! Shared types for the RegenThemFund event relay.
//!
//! - [`objects`] holds the fund data model and the relay wire protocol.
//! - [`source`] defines the chain-data collaborator used to enrich events.
//! - [`client`] (feature `client`) is the live-update channel used by
//!   front-ends to follow new funds.

pub mod objects;
pub mod source;

#[cfg(feature = "client")]
pub mod client;
