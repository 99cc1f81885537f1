//! Shared helpers for integration tests: an in-process executor driven
//! event by event, so command flows are fully deterministic.
#![allow(dead_code)]

use rill::client::ClientId;
use rill::executor::{Executor, ExecutorEvent};
use rill::resp::RespValue;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// An executor plus the bookkeeping to speak to it like connections do.
pub struct TestServer {
    executor: Executor,
}

/// One simulated connection: its ID and the receiving end of its outbound
/// queue.
pub struct TestClient {
    pub id: ClientId,
    replies: mpsc::UnboundedReceiver<RespValue>,
}

impl TestServer {
    pub fn new() -> Self {
        TestServer {
            executor: Executor::new(),
        }
    }

    pub fn connect(&mut self, id: u64) -> TestClient {
        let (outbound, replies) = mpsc::unbounded_channel();
        self.executor.handle_event(ExecutorEvent::Connect {
            client: ClientId(id),
            outbound,
        });
        TestClient {
            id: ClientId(id),
            replies,
        }
    }

    pub fn disconnect(&mut self, client: &TestClient) {
        self.executor
            .handle_event(ExecutorEvent::Disconnect { client: client.id });
    }

    /// Submits one command frame on behalf of `client`.
    pub fn request(&mut self, client: &TestClient, parts: &[&str]) {
        self.executor.handle_event(ExecutorEvent::Request {
            client: client.id,
            frame: command(parts),
        });
    }

    /// Runs the timeout sweep the event loop would run now.
    pub fn expire_timeouts(&mut self) {
        self.executor.expire_timeouts(Instant::now());
    }
}

impl TestClient {
    /// The next queued reply, if any.
    pub fn next_reply(&mut self) -> Option<RespValue> {
        self.replies.try_recv().ok()
    }

    pub fn expect_reply(&mut self, expected: RespValue) {
        assert_eq!(self.next_reply(), Some(expected));
    }

    pub fn expect_no_reply(&mut self) {
        assert_eq!(self.next_reply(), None);
    }
}

/// Builds a request frame: an array of bulk strings.
pub fn command(parts: &[&str]) -> RespValue {
    RespValue::array_of_bulks(parts.iter().map(|part| part.as_bytes().to_vec()))
}

pub fn bulk(data: &str) -> RespValue {
    RespValue::bulk(data.as_bytes().to_vec())
}

pub fn simple(text: &str) -> RespValue {
    RespValue::SimpleString(text.to_string())
}

pub fn error(text: &str) -> RespValue {
    RespValue::SimpleError(text.to_string())
}

pub fn bulk_array(parts: &[&str]) -> RespValue {
    RespValue::array_of_bulks(parts.iter().map(|part| part.as_bytes().to_vec()))
}
