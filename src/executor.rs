//! The single-task command executor and its event loop.
//!
//! Every mutation of shared state — store, stream indexes, blocked-waiter
//! registry, pub/sub registry, per-connection records — happens on one
//! task. Reader tasks only parse and enqueue; writer tasks only drain
//! outbound queues. The executor being the sole serialization point is
//! what makes the domain state lock-free.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::blocked::BlockedRegistry;
use crate::client::{ClientId, ClientRecord, SessionMode};
use crate::command::Command;
use crate::commands::{self, CommandError};
use crate::pubsub::PubSubRegistry;
use crate::resp::RespValue;
use crate::store::Store;

/// Everything the executor reacts to. Connection setup and teardown travel
/// over the same channel as requests, which serializes registration with
/// command execution — no shared map, no locks.
#[derive(Debug)]
pub enum ExecutorEvent {
    Connect {
        client: ClientId,
        outbound: mpsc::UnboundedSender<RespValue>,
    },
    Request {
        client: ClientId,
        frame: RespValue,
    },
    Disconnect {
        client: ClientId,
    },
}

/// What executing a command produced. `NoResponse` means the client is now
/// blocked and nothing must be written; it is deliberately not a
/// [`RespValue`], so it can never leak onto the wire.
#[derive(Debug, PartialEq)]
pub enum ExecResult {
    Reply(RespValue),
    NoResponse,
}

/// Borrowed view of the executor's state handed to command functions.
pub struct ExecutionContext<'a> {
    pub store: &'a mut Store,
    pub blocked: &'a mut BlockedRegistry,
    pub pubsub: &'a mut PubSubRegistry,
    pub clients: &'a mut HashMap<ClientId, ClientRecord>,
    /// The connection the command arrived on.
    pub client_id: ClientId,
    /// Set while running an EXEC batch; blocking commands must not block.
    pub in_exec: bool,
}

impl ExecutionContext<'_> {
    fn subscribed(&self) -> bool {
        self.clients
            .get(&self.client_id)
            .is_some_and(|record| record.mode == SessionMode::Subscribed)
    }
}

/// Runs one command for the current client, applying the two pre-dispatch
/// guards: the subscribed-mode allow-list, then transaction queuing.
pub fn execute(command: &Command, ctx: &mut ExecutionContext) -> ExecResult {
    let record = ctx
        .clients
        .get_mut(&ctx.client_id)
        .expect("executor only dispatches for registered clients");

    if record.mode == SessionMode::Subscribed && !command.allowed_while_subscribed() {
        return ExecResult::Reply(
            CommandError::NotAllowedWhileSubscribed(command.name()).to_resp(),
        );
    }

    if let SessionMode::Multi(queued) = &mut record.mode {
        if !command.is_transaction_control() {
            queued.push(command.clone());
            return ExecResult::Reply(RespValue::SimpleString("QUEUED".to_string()));
        }
    }

    match dispatch(command, ctx) {
        Ok(result) => result,
        Err(err) => ExecResult::Reply(err.to_resp()),
    }
}

/// The dispatch table proper, shared by `execute` and EXEC batches (which
/// bypass the guards on purpose).
pub(crate) fn dispatch(
    command: &Command,
    ctx: &mut ExecutionContext,
) -> Result<ExecResult, CommandError> {
    let reply = match command {
        Command::Ping(arguments) => commands::ping(arguments, ctx.subscribed()),
        Command::Echo(arguments) => commands::echo(arguments),
        Command::Get(arguments) => commands::get(arguments, ctx.store)?,
        Command::Set(arguments) => commands::set(arguments, ctx.store)?,
        Command::Incr(arguments) => commands::incr(arguments, ctx.store)?,
        Command::Type(arguments) => commands::type_command(arguments, ctx.store),
        Command::Keys(arguments) => commands::keys(arguments, ctx.store)?,
        Command::RPush(arguments) => commands::push(arguments, false, ctx)?,
        Command::LPush(arguments) => commands::push(arguments, true, ctx)?,
        Command::LPop(arguments) => commands::pop(arguments, true, ctx.store)?,
        Command::RPop(arguments) => commands::pop(arguments, false, ctx.store)?,
        Command::BlPop(arguments) => return commands::blpop(arguments, ctx),
        Command::LLen(arguments) => commands::llen(arguments, ctx.store)?,
        Command::LRange(arguments) => commands::lrange(arguments, ctx.store)?,
        Command::XAdd(arguments) => commands::xadd(arguments, ctx)?,
        Command::XRange(arguments) => commands::xrange(arguments, ctx.store)?,
        Command::XRead(arguments) => return commands::xread(arguments, ctx),
        Command::Multi => commands::transactions::multi(ctx)?,
        Command::Exec => commands::transactions::exec(ctx)?,
        Command::Discard => commands::transactions::discard(ctx)?,
        Command::Subscribe(arguments) => commands::pub_sub::subscribe(arguments, ctx),
        Command::Unsubscribe(arguments) => commands::pub_sub::unsubscribe(arguments, ctx),
        Command::Publish(arguments) => commands::pub_sub::publish(arguments, ctx),
    };

    Ok(ExecResult::Reply(reply))
}

/// Owner of all domain state; drives the event loop.
#[derive(Default)]
pub struct Executor {
    store: Store,
    blocked: BlockedRegistry,
    pubsub: PubSubRegistry,
    clients: HashMap<ClientId, ClientRecord>,
}

/// Upper bound on how long the loop sleeps with no waiter deadline in
/// sight, so wake-ups stay responsive even when the heap is empty.
const IDLE_TICK: Duration = Duration::from_millis(100);

impl Executor {
    pub fn new() -> Self {
        Executor::default()
    }

    /// The event loop: expire timeouts, then wait for the next event or the
    /// earliest deadline, whichever comes first. Ends when every event
    /// sender is gone.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<ExecutorEvent>) {
        loop {
            self.expire_timeouts(Instant::now());

            let cap = Instant::now() + IDLE_TICK;
            let deadline = self
                .blocked
                .earliest_deadline()
                .map_or(cap, |deadline| deadline.min(cap));

            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                _ = tokio::time::sleep_until(deadline) => {}
            }
        }
    }

    /// Processes one event synchronously. Public so tests can drive the
    /// executor deterministically without spawning the loop.
    pub fn handle_event(&mut self, event: ExecutorEvent) {
        match event {
            ExecutorEvent::Connect { client, outbound } => {
                debug!(%client, "connection registered");
                self.clients.insert(client, ClientRecord::new(client, outbound));
            }
            ExecutorEvent::Disconnect { client } => {
                debug!(%client, "connection removed");
                self.blocked.unblock(client);
                if let Some(record) = self.clients.remove(&client) {
                    self.pubsub.drop_client(client, record.subscriptions.iter());
                }
            }
            ExecutorEvent::Request { client, frame } => {
                if !self.clients.contains_key(&client) {
                    return;
                }

                let reply = match Command::parse(&frame) {
                    Err(err) => Some(err.to_resp()),
                    Ok(command) => {
                        let mut ctx = ExecutionContext {
                            store: &mut self.store,
                            blocked: &mut self.blocked,
                            pubsub: &mut self.pubsub,
                            clients: &mut self.clients,
                            client_id: client,
                            in_exec: false,
                        };

                        match std::panic::catch_unwind(AssertUnwindSafe(|| {
                            execute(&command, &mut ctx)
                        })) {
                            Ok(ExecResult::Reply(value)) => Some(value),
                            Ok(ExecResult::NoResponse) => None,
                            Err(_) => {
                                warn!(%client, command = command.name(), "command panicked");
                                Some(RespValue::SimpleError("ERR internal".to_string()))
                            }
                        }
                    }
                };

                if let Some(value) = reply {
                    if let Some(record) = self.clients.get(&client) {
                        record.send(value);
                    }
                }
            }
        }
    }

    /// Delivers the timeout reply to every waiter whose deadline has
    /// passed. Blocking commands time out to a null array.
    pub fn expire_timeouts(&mut self, now: Instant) {
        for (client, _command) in self.blocked.expire_before(now) {
            debug!(%client, "blocking command timed out");
            if let Some(record) = self.clients.get(&client) {
                record.send(RespValue::NullArray);
            }
        }
    }
}
