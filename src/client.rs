//! Per-connection state as seen by the executor.

use std::collections::HashSet;
use std::fmt;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::command::Command;
use crate::resp::RespValue;

/// Identifies a connection for the lifetime of the process. Allocated by
/// the accept loop, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// The connection's protocol mode.
///
/// - `Standard`: commands execute immediately.
/// - `Multi`: commands queue until EXEC or DISCARD; the queue rides in the
///   variant so it cannot outlive the mode.
/// - `Subscribed`: only the pub/sub allow-list may run.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionMode {
    #[default]
    Standard,
    Multi(Vec<Command>),
    Subscribed,
}

/// Everything the executor tracks per connection.
#[derive(Debug)]
pub struct ClientRecord {
    pub id: ClientId,
    pub mode: SessionMode,
    pub subscriptions: HashSet<Bytes>,
    outbound: mpsc::UnboundedSender<RespValue>,
}

impl ClientRecord {
    pub fn new(id: ClientId, outbound: mpsc::UnboundedSender<RespValue>) -> Self {
        ClientRecord {
            id,
            mode: SessionMode::default(),
            subscriptions: HashSet::new(),
            outbound,
        }
    }

    /// Appends a value to the connection's outbound queue. A closed queue
    /// means the writer task is already gone and the disconnect event is in
    /// flight; the value is dropped.
    pub fn send(&self, value: RespValue) {
        let _ = self.outbound.send(value);
    }

    /// Number of channels this connection is subscribed to. Cannot
    /// underflow: it is the size of the subscription set.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}
