//! Per-connection socket plumbing: a reader task that parses frames into
//! executor events, and a writer task that drains the outbound queue.

use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::client::ClientId;
use crate::executor::ExecutorEvent;
use crate::resp::{RespParser, RespValue, RespWriter};

/// Drives one client connection to completion.
///
/// Registers the connection with the executor, splits the socket into a
/// reader loop (this task) and a writer task, and on reader exit sends the
/// disconnect event. The writer drains naturally: once the executor drops
/// the client record, the last outbound sender is gone and the queue
/// closes after the remaining replies are flushed.
pub async fn handle_connection(
    stream: TcpStream,
    client: ClientId,
    events: mpsc::UnboundedSender<ExecutorEvent>,
) {
    let (read_half, write_half) = stream.into_split();
    let (outbound, replies) = mpsc::unbounded_channel();

    if events
        .send(ExecutorEvent::Connect {
            client,
            outbound: outbound.clone(),
        })
        .is_err()
    {
        return;
    }

    let writer = tokio::spawn(drain_outbound(client, write_half, replies));

    read_frames(read_half, client, &events, &outbound).await;

    let _ = events.send(ExecutorEvent::Disconnect { client });
    drop(outbound);
    let _ = writer.await;
}

/// Reads frames until end-of-stream or a protocol error. Every parsed
/// frame is handed to the executor in arrival order; a protocol error is
/// fatal to the connection and gets one final error line before teardown.
async fn read_frames(
    read_half: OwnedReadHalf,
    client: ClientId,
    events: &mpsc::UnboundedSender<ExecutorEvent>,
    outbound: &mpsc::UnboundedSender<RespValue>,
) {
    let mut parser = RespParser::new(BufReader::new(read_half));

    loop {
        match parser.read_value().await {
            Ok(Some(frame)) => {
                if events
                    .send(ExecutorEvent::Request { client, frame })
                    .is_err()
                {
                    break;
                }
            }
            Ok(None) => {
                debug!(%client, "connection closed by peer");
                break;
            }
            Err(err) => {
                debug!(%client, %err, "protocol error, closing connection");
                let _ = outbound.send(RespValue::SimpleError(format!(
                    "ERR Protocol error: {}",
                    err
                )));
                break;
            }
        }
    }
}

/// Serializes outbound values to the socket in queue order.
async fn drain_outbound(
    client: ClientId,
    write_half: OwnedWriteHalf,
    mut replies: mpsc::UnboundedReceiver<RespValue>,
) {
    let mut writer = RespWriter::new(write_half);

    while let Some(value) = replies.recv().await {
        if let Err(err) = writer.write_value(&value).await {
            error!(%client, %err, "failed to write reply, dropping connection");
            break;
        }
    }
}
