//! Protocol repository: the protocol list under a single collection key.

use tracing::info;

use edc_model::Protocol;

use crate::error::{Result, StoreError};
use crate::kv::{KeyValueStore, load_collection, save_collection};

pub const PROTOCOLS_KEY: &str = "protocols";

#[derive(Debug)]
pub struct ProtocolStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> ProtocolStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn all(&self) -> Result<Vec<Protocol>> {
        load_collection(&self.store, PROTOCOLS_KEY)
    }

    pub fn find(&self, protocol_number: &str) -> Result<Protocol> {
        self.all()?
            .into_iter()
            .find(|p| p.protocol_number == protocol_number)
            .ok_or_else(|| StoreError::NotFound {
                kind: "protocol",
                key: protocol_number.to_string(),
            })
    }

    /// Upsert a protocol by protocol number.
    pub fn save_protocol(&mut self, protocol: Protocol) -> Result<()> {
        let mut protocols = self.all()?;
        match protocols
            .iter_mut()
            .find(|p| p.protocol_number == protocol.protocol_number)
        {
            Some(existing) => *existing = protocol,
            None => {
                info!(protocol = %protocol.protocol_number, "registered new protocol");
                protocols.push(protocol);
            }
        }
        save_collection(&mut self.store, PROTOCOLS_KEY, &protocols)
    }
}
