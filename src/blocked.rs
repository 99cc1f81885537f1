//! Registry of clients suspended on blocking commands.
//!
//! Three structures are kept mutually consistent:
//!
//! - per-key FIFO queues of waiting clients,
//! - a client → registration map (the keys a client waits on, plus the
//!   command that suspended it),
//! - a min-heap of timeout deadlines.
//!
//! Invariants: a client sits in a key's queue iff the key is in its
//! registration (B1); a client appears at most once per key (B2); removing
//! a registration purges the client from every queue (B3). Heap entries are
//! not removed on unblock — they tombstone in place and are skipped when
//! they surface, which keeps `unblock` proportional to the client's key
//! count.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use bytes::Bytes;
use tokio::time::Instant;

use crate::client::ClientId;
use crate::stream::StreamId;

/// The command a blocked client is suspended on, carrying what is needed to
/// produce its reply when it wakes.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockedCommand {
    BlPop {
        key: Bytes,
    },
    /// Resolved `(key, start)` pairs; every delivered entry must be
    /// strictly newer than its key's start.
    XRead {
        starts: Vec<(Bytes, StreamId)>,
    },
}

#[derive(Debug)]
struct Registration {
    keys: Vec<Bytes>,
    command: BlockedCommand,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct TimeoutEntry {
    deadline: Instant,
    seq: u64,
    client: ClientId,
}

#[derive(Debug, Default)]
pub struct BlockedRegistry {
    queues: HashMap<Bytes, VecDeque<ClientId>>,
    registrations: HashMap<ClientId, Registration>,
    timeouts: BinaryHeap<Reverse<TimeoutEntry>>,
    timeout_seq: u64,
}

impl BlockedRegistry {
    pub fn new() -> Self {
        BlockedRegistry::default()
    }

    /// Registers `client` at the tail of every key's queue. A `None`
    /// deadline means the client waits forever. Duplicate keys within one
    /// call collapse to a single registration.
    pub fn block(
        &mut self,
        client: ClientId,
        keys: impl IntoIterator<Item = Bytes>,
        command: BlockedCommand,
        deadline: Option<Instant>,
    ) {
        debug_assert!(
            !self.registrations.contains_key(&client),
            "a blocked client cannot issue another blocking command"
        );

        let mut registered: Vec<Bytes> = Vec::new();
        for key in keys {
            if registered.contains(&key) {
                continue;
            }
            self.queues.entry(key.clone()).or_default().push_back(client);
            registered.push(key);
        }

        self.registrations.insert(
            client,
            Registration {
                keys: registered,
                command,
            },
        );

        if let Some(deadline) = deadline {
            self.timeouts.push(Reverse(TimeoutEntry {
                deadline,
                seq: self.timeout_seq,
                client,
            }));
            self.timeout_seq += 1;
        }
    }

    pub fn is_blocked(&self, client: ClientId) -> bool {
        self.registrations.contains_key(&client)
    }

    /// The client at the head of `key`'s queue, without removing it.
    pub fn head_for_key(&self, key: &[u8]) -> Option<ClientId> {
        self.queues.get(key).and_then(|queue| queue.front()).copied()
    }

    pub fn blocked_command(&self, client: ClientId) -> Option<&BlockedCommand> {
        self.registrations.get(&client).map(|reg| &reg.command)
    }

    /// Pops the longest-waiting client for `key` and tears down its whole
    /// registration, including queue entries under other keys.
    pub fn next_client_for_key(&mut self, key: &[u8]) -> Option<(ClientId, BlockedCommand)> {
        let client = {
            let queue = self.queues.get_mut(key)?;
            let client = queue.pop_front()?;
            if queue.is_empty() {
                self.queues.remove(key);
            }
            client
        };

        let registration = self
            .registrations
            .remove(&client)
            .expect("queued client must be registered");

        for other_key in &registration.keys {
            if other_key.as_ref() != key {
                self.remove_from_queue(other_key, client);
            }
        }

        Some((client, registration.command))
    }

    /// Removes `client` from every queue it waits in. The timeout-heap
    /// entry stays behind as a tombstone.
    pub fn unblock(&mut self, client: ClientId) -> Option<BlockedCommand> {
        let registration = self.registrations.remove(&client)?;
        for key in &registration.keys {
            self.remove_from_queue(key, client);
        }
        Some(registration.command)
    }

    /// The next live deadline. Tombstones surfacing at the top of the heap
    /// are discarded on the way.
    pub fn earliest_deadline(&mut self) -> Option<Instant> {
        while let Some(Reverse(entry)) = self.timeouts.peek() {
            if self.registrations.contains_key(&entry.client) {
                return Some(entry.deadline);
            }
            self.timeouts.pop();
        }
        None
    }

    /// Pops every deadline at or before `now` and unblocks the clients that
    /// are still registered, in deadline order (ties in push order). Stale
    /// tombstones produce nothing.
    pub fn expire_before(&mut self, now: Instant) -> Vec<(ClientId, BlockedCommand)> {
        let mut expired = Vec::new();

        while let Some(Reverse(entry)) = self.timeouts.peek() {
            if entry.deadline > now {
                break;
            }
            let client = entry.client;
            self.timeouts.pop();

            if let Some(command) = self.unblock(client) {
                expired.push((client, command));
            }
        }

        expired
    }

    fn remove_from_queue(&mut self, key: &[u8], client: ClientId) {
        if let Some(queue) = self.queues.get_mut(key) {
            queue.retain(|waiter| *waiter != client);
            if queue.is_empty() {
                self.queues.remove(key);
            }
        }
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        // B1 in both directions, and B2.
        for (client, registration) in &self.registrations {
            for key in &registration.keys {
                let queue = self
                    .queues
                    .get(key)
                    .unwrap_or_else(|| panic!("queue for registered key missing"));
                let occurrences = queue.iter().filter(|waiter| *waiter == client).count();
                assert_eq!(occurrences, 1, "client must appear exactly once per key");
            }
        }
        for (key, queue) in &self.queues {
            for client in queue {
                let registration = self
                    .registrations
                    .get(client)
                    .expect("queued client must be registered");
                assert!(registration.keys.contains(key));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn key(name: &str) -> Bytes {
        Bytes::copy_from_slice(name.as_bytes())
    }

    fn blpop_on(name: &str) -> BlockedCommand {
        BlockedCommand::BlPop { key: key(name) }
    }

    #[test]
    fn test_fifo_wake_order_per_key() {
        let mut registry = BlockedRegistry::new();
        for id in 1..=3 {
            registry.block(ClientId(id), [key("L")], blpop_on("L"), None);
        }
        registry.assert_invariants();

        assert_eq!(registry.head_for_key(b"L"), Some(ClientId(1)));

        let order: Vec<ClientId> = std::iter::from_fn(|| {
            registry
                .next_client_for_key(b"L")
                .map(|(client, _)| client)
        })
        .collect();
        assert_eq!(order, vec![ClientId(1), ClientId(2), ClientId(3)]);
        registry.assert_invariants();
    }

    #[test]
    fn test_next_client_purges_other_keys() {
        let mut registry = BlockedRegistry::new();
        registry.block(
            ClientId(1),
            [key("a"), key("b")],
            BlockedCommand::XRead {
                starts: vec![(key("a"), StreamId::ZERO), (key("b"), StreamId::ZERO)],
            },
            None,
        );
        registry.block(ClientId(2), [key("b")], blpop_on("b"), None);
        registry.assert_invariants();

        let (client, _) = registry.next_client_for_key(b"a").unwrap();
        assert_eq!(client, ClientId(1));
        registry.assert_invariants();

        // Client 1 must be gone from "b" as well; client 2 is now the head.
        assert_eq!(registry.head_for_key(b"b"), Some(ClientId(2)));
        assert!(!registry.is_blocked(ClientId(1)));
    }

    #[test]
    fn test_duplicate_keys_collapse() {
        let mut registry = BlockedRegistry::new();
        registry.block(
            ClientId(7),
            [key("k"), key("k")],
            blpop_on("k"),
            None,
        );
        registry.assert_invariants();

        assert!(registry.next_client_for_key(b"k").is_some());
        assert!(registry.next_client_for_key(b"k").is_none());
    }

    #[test]
    fn test_unblock_purges_all_queues() {
        let mut registry = BlockedRegistry::new();
        registry.block(
            ClientId(1),
            [key("a"), key("b")],
            BlockedCommand::XRead {
                starts: vec![(key("a"), StreamId::ZERO), (key("b"), StreamId::ZERO)],
            },
            None,
        );

        assert!(registry.unblock(ClientId(1)).is_some());
        registry.assert_invariants();
        assert_eq!(registry.head_for_key(b"a"), None);
        assert_eq!(registry.head_for_key(b"b"), None);
        assert_eq!(registry.unblock(ClientId(1)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_before_in_deadline_order() {
        let mut registry = BlockedRegistry::new();
        let now = Instant::now();

        registry.block(
            ClientId(1),
            [key("a")],
            blpop_on("a"),
            Some(now + Duration::from_millis(300)),
        );
        registry.block(
            ClientId(2),
            [key("b")],
            blpop_on("b"),
            Some(now + Duration::from_millis(100)),
        );
        registry.block(
            ClientId(3),
            [key("c")],
            blpop_on("c"),
            Some(now + Duration::from_millis(200)),
        );

        assert_eq!(
            registry.earliest_deadline(),
            Some(now + Duration::from_millis(100))
        );

        let expired = registry.expire_before(now + Duration::from_millis(250));
        let order: Vec<ClientId> = expired.iter().map(|(client, _)| *client).collect();
        assert_eq!(order, vec![ClientId(2), ClientId(3)]);
        registry.assert_invariants();

        assert!(registry.is_blocked(ClientId(1)));
        let expired = registry.expire_before(now + Duration::from_millis(400));
        assert_eq!(expired.len(), 1);
        assert!(registry.expire_before(now + Duration::from_secs(10)).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_equal_deadlines_expire_in_push_order() {
        let mut registry = BlockedRegistry::new();
        let deadline = Instant::now() + Duration::from_millis(50);

        for id in [5, 1, 9] {
            registry.block(ClientId(id), [key("k")], blpop_on("k"), Some(deadline));
        }

        let expired = registry.expire_before(deadline);
        let order: Vec<ClientId> = expired.iter().map(|(client, _)| *client).collect();
        assert_eq!(order, vec![ClientId(5), ClientId(1), ClientId(9)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_tombstones_produce_nothing() {
        let mut registry = BlockedRegistry::new();
        let now = Instant::now();

        registry.block(
            ClientId(1),
            [key("k")],
            blpop_on("k"),
            Some(now + Duration::from_millis(100)),
        );

        // Woken by data before the deadline: heap entry becomes stale.
        assert!(registry.next_client_for_key(b"k").is_some());

        assert_eq!(registry.earliest_deadline(), None);
        assert!(registry.expire_before(now + Duration::from_secs(1)).is_empty());

        // A fresh registration after the tombstone still expires normally.
        registry.block(
            ClientId(2),
            [key("k")],
            blpop_on("k"),
            Some(now + Duration::from_millis(500)),
        );
        let expired = registry.expire_before(now + Duration::from_secs(1));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].0, ClientId(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_never_expires() {
        let mut registry = BlockedRegistry::new();
        registry.block(ClientId(1), [key("k")], blpop_on("k"), None);

        assert_eq!(registry.earliest_deadline(), None);
        assert!(registry
            .expire_before(Instant::now() + Duration::from_secs(3600))
            .is_empty());
        assert!(registry.is_blocked(ClientId(1)));
    }
}
