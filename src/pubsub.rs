//! Channel → subscriber registry for SUBSCRIBE/UNSUBSCRIBE/PUBLISH.
//!
//! The registry only tracks membership; message delivery goes through the
//! executor's per-client outbound queues.

use std::collections::{HashMap, HashSet};

use bytes::Bytes;

use crate::client::ClientId;

#[derive(Debug, Default)]
pub struct PubSubRegistry {
    channels: HashMap<Bytes, HashSet<ClientId>>,
}

impl PubSubRegistry {
    pub fn new() -> Self {
        PubSubRegistry::default()
    }

    /// Returns `true` if the client was not already subscribed.
    pub fn subscribe(&mut self, channel: Bytes, client: ClientId) -> bool {
        self.channels.entry(channel).or_default().insert(client)
    }

    /// Returns `true` if the client had been subscribed.
    pub fn unsubscribe(&mut self, channel: &[u8], client: ClientId) -> bool {
        let Some(subscribers) = self.channels.get_mut(channel) else {
            return false;
        };

        let removed = subscribers.remove(&client);
        if subscribers.is_empty() {
            self.channels.remove(channel);
        }
        removed
    }

    pub fn subscribers(&self, channel: &[u8]) -> impl Iterator<Item = ClientId> + '_ {
        self.channels
            .get(channel)
            .into_iter()
            .flat_map(|subscribers| subscribers.iter().copied())
    }

    pub fn subscriber_count(&self, channel: &[u8]) -> usize {
        self.channels
            .get(channel)
            .map_or(0, |subscribers| subscribers.len())
    }

    /// Removes the client from the given channels (connection teardown).
    pub fn drop_client<'a>(
        &mut self,
        client: ClientId,
        channels: impl IntoIterator<Item = &'a Bytes>,
    ) {
        for channel in channels {
            self.unsubscribe(channel, client);
        }
    }
}
