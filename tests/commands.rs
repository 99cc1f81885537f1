//! Command semantics driven through a real executor, one event at a time.

mod common;

use std::time::Duration;

use common::{TestServer, bulk, bulk_array, error, simple};
use rill::resp::RespValue;

#[tokio::test]
async fn test_ping_and_echo() {
    let mut server = TestServer::new();
    let mut client = server.connect(1);

    server.request(&client, &["PING"]);
    server.request(&client, &["ECHO", "hello"]);

    client.expect_reply(simple("PONG"));
    client.expect_reply(bulk("hello"));
}

#[tokio::test(start_paused = true)]
async fn test_set_with_expiry_then_get() {
    let mut server = TestServer::new();
    let mut client = server.connect(1);

    server.request(&client, &["SET", "k", "v", "PX", "100"]);
    server.request(&client, &["GET", "k"]);
    client.expect_reply(simple("OK"));
    client.expect_reply(bulk("v"));

    tokio::time::advance(Duration::from_millis(150)).await;

    server.request(&client, &["GET", "k"]);
    client.expect_reply(RespValue::Null);
}

#[tokio::test]
async fn test_incr_semantics() {
    let mut server = TestServer::new();
    let mut client = server.connect(1);

    server.request(&client, &["INCR", "counter"]);
    server.request(&client, &["INCR", "counter"]);
    server.request(&client, &["GET", "counter"]);
    server.request(&client, &["TYPE", "counter"]);
    server.request(&client, &["SET", "text", "abc"]);
    server.request(&client, &["INCR", "text"]);

    client.expect_reply(RespValue::Integer(1));
    client.expect_reply(RespValue::Integer(2));
    client.expect_reply(bulk("2"));
    client.expect_reply(simple("string"));
    client.expect_reply(simple("OK"));
    client.expect_reply(error("ERR value is not an integer or out of range"));
}

#[tokio::test]
async fn test_list_push_pop_range() {
    let mut server = TestServer::new();
    let mut client = server.connect(1);

    server.request(&client, &["RPUSH", "l", "b", "c"]);
    server.request(&client, &["LPUSH", "l", "a"]);
    server.request(&client, &["LLEN", "l"]);
    server.request(&client, &["LRANGE", "l", "0", "-1"]);
    server.request(&client, &["LPOP", "l"]);
    server.request(&client, &["RPOP", "l"]);
    server.request(&client, &["LRANGE", "l", "0", "-1"]);

    client.expect_reply(RespValue::Integer(2));
    client.expect_reply(RespValue::Integer(3));
    client.expect_reply(RespValue::Integer(3));
    client.expect_reply(bulk_array(&["a", "b", "c"]));
    client.expect_reply(bulk("a"));
    client.expect_reply(bulk("c"));
    client.expect_reply(bulk_array(&["b"]));
}

#[tokio::test]
async fn test_pop_count_out_of_range_is_null() {
    let mut server = TestServer::new();
    let mut client = server.connect(1);

    server.request(&client, &["RPUSH", "l", "a", "b"]);
    server.request(&client, &["LPOP", "l", "5"]);
    server.request(&client, &["LPOP", "l", "0"]);
    server.request(&client, &["LPOP", "l", "2"]);

    client.expect_reply(RespValue::Integer(2));
    client.expect_reply(RespValue::Null);
    client.expect_reply(RespValue::Null);
    client.expect_reply(bulk_array(&["a", "b"]));
}

#[tokio::test]
async fn test_wrong_type_errors() {
    let mut server = TestServer::new();
    let mut client = server.connect(1);
    let wrongtype = error("WRONGTYPE Operation against a key holding the wrong kind of value");

    server.request(&client, &["RPUSH", "l", "a"]);
    server.request(&client, &["GET", "l"]);
    server.request(&client, &["SET", "s", "v"]);
    server.request(&client, &["LLEN", "s"]);
    server.request(&client, &["XADD", "s", "1-1", "f", "v"]);

    client.expect_reply(RespValue::Integer(1));
    client.expect_reply(wrongtype.clone());
    client.expect_reply(simple("OK"));
    client.expect_reply(wrongtype.clone());
    client.expect_reply(wrongtype);
}

#[tokio::test]
async fn test_keys_pattern() {
    let mut server = TestServer::new();
    let mut client = server.connect(1);

    server.request(&client, &["SET", "user:1", "a"]);
    server.request(&client, &["SET", "user:2", "b"]);
    server.request(&client, &["SET", "other", "c"]);
    server.request(&client, &["KEYS", "user:*"]);

    client.expect_reply(simple("OK"));
    client.expect_reply(simple("OK"));
    client.expect_reply(simple("OK"));

    let Some(RespValue::Array(mut matched)) = client.next_reply() else {
        panic!("KEYS must reply with an array");
    };
    matched.sort_by_key(|value| format!("{:?}", value));
    assert_eq!(matched, vec![bulk("user:1"), bulk("user:2")]);
}

#[tokio::test]
async fn test_stream_xadd_xrange() {
    let mut server = TestServer::new();
    let mut client = server.connect(1);

    // Scenario: 0-0 rejected, 1-1 accepted, duplicate 1-1 rejected.
    server.request(&client, &["XADD", "s", "0-0", "f", "v"]);
    server.request(&client, &["XADD", "s", "1-1", "f", "v"]);
    server.request(&client, &["XADD", "s", "1-1", "f", "v"]);
    server.request(&client, &["XADD", "s", "2-0", "g", "w"]);
    server.request(&client, &["XRANGE", "s", "-", "+"]);
    server.request(&client, &["TYPE", "s"]);

    client.expect_reply(error("ERR The ID specified in XADD must be greater than 0-0"));
    client.expect_reply(bulk("1-1"));
    client.expect_reply(error(
        "ERR The ID specified in XADD is equal or smaller than the target stream top item",
    ));
    client.expect_reply(bulk("2-0"));
    client.expect_reply(RespValue::Array(vec![
        RespValue::Array(vec![bulk("1-1"), bulk_array(&["f", "v"])]),
        RespValue::Array(vec![bulk("2-0"), bulk_array(&["g", "w"])]),
    ]));
    client.expect_reply(simple("stream"));
}

#[tokio::test]
async fn test_xadd_auto_sequence() {
    let mut server = TestServer::new();
    let mut client = server.connect(1);

    server.request(&client, &["XADD", "s", "5-*", "f", "v"]);
    server.request(&client, &["XADD", "s", "5-*", "f", "v"]);
    server.request(&client, &["XADD", "s", "0-*", "f", "v"]);

    client.expect_reply(bulk("5-0"));
    client.expect_reply(bulk("5-1"));
    client.expect_reply(error(
        "ERR The ID specified in XADD is equal or smaller than the target stream top item",
    ));
}

#[tokio::test]
async fn test_xread_immediate() {
    let mut server = TestServer::new();
    let mut client = server.connect(1);

    server.request(&client, &["XADD", "s", "1-0", "f", "v"]);
    server.request(&client, &["XADD", "s", "2-0", "g", "w"]);
    client.expect_reply(bulk("1-0"));
    client.expect_reply(bulk("2-0"));

    // Exclusive start: entries strictly after 1-0.
    server.request(&client, &["XREAD", "STREAMS", "s", "1-0"]);
    client.expect_reply(RespValue::Array(vec![RespValue::Array(vec![
        bulk("s"),
        RespValue::Array(vec![RespValue::Array(vec![
            bulk("2-0"),
            bulk_array(&["g", "w"]),
        ])]),
    ])]));

    // Nothing newer and no BLOCK: null array, not an empty one.
    server.request(&client, &["XREAD", "STREAMS", "s", "2-0"]);
    client.expect_reply(RespValue::NullArray);

    // Empty keys are omitted from a mixed result.
    server.request(&client, &["XADD", "t", "9-0", "x", "y"]);
    client.expect_reply(bulk("9-0"));
    server.request(&client, &["XREAD", "STREAMS", "s", "t", "2-0", "0-0"]);
    client.expect_reply(RespValue::Array(vec![RespValue::Array(vec![
        bulk("t"),
        RespValue::Array(vec![RespValue::Array(vec![
            bulk("9-0"),
            bulk_array(&["x", "y"]),
        ])]),
    ])]));
}

#[tokio::test]
async fn test_transaction_queue_exec() {
    let mut server = TestServer::new();
    let mut client = server.connect(1);

    // Scenario: MULTI, SET a 1, INCR a, EXEC.
    server.request(&client, &["MULTI"]);
    server.request(&client, &["SET", "a", "1"]);
    server.request(&client, &["INCR", "a"]);
    server.request(&client, &["EXEC"]);

    client.expect_reply(simple("OK"));
    client.expect_reply(simple("QUEUED"));
    client.expect_reply(simple("QUEUED"));
    client.expect_reply(RespValue::Array(vec![
        simple("OK"),
        RespValue::Integer(2),
    ]));
}

#[tokio::test]
async fn test_transaction_errors_do_not_abort_batch() {
    let mut server = TestServer::new();
    let mut client = server.connect(1);

    server.request(&client, &["MULTI"]);
    server.request(&client, &["SET", "t", "text"]);
    server.request(&client, &["INCR", "t"]);
    server.request(&client, &["SET", "u", "1"]);
    server.request(&client, &["EXEC"]);

    client.expect_reply(simple("OK"));
    for _ in 0..3 {
        client.expect_reply(simple("QUEUED"));
    }
    client.expect_reply(RespValue::Array(vec![
        simple("OK"),
        error("ERR value is not an integer or out of range"),
        simple("OK"),
    ]));

    // The failing INCR did not roll anything back.
    server.request(&client, &["GET", "u"]);
    client.expect_reply(bulk("1"));
}

#[tokio::test]
async fn test_transaction_state_errors() {
    let mut server = TestServer::new();
    let mut client = server.connect(1);

    server.request(&client, &["EXEC"]);
    server.request(&client, &["DISCARD"]);
    server.request(&client, &["MULTI"]);
    server.request(&client, &["MULTI"]);
    server.request(&client, &["DISCARD"]);

    client.expect_reply(error("ERR EXEC without MULTI"));
    client.expect_reply(error("ERR DISCARD without MULTI"));
    client.expect_reply(simple("OK"));
    client.expect_reply(error("ERR MULTI calls can not be nested"));
    client.expect_reply(simple("OK"));
}

#[tokio::test]
async fn test_discard_drops_queued_commands() {
    let mut server = TestServer::new();
    let mut client = server.connect(1);

    server.request(&client, &["MULTI"]);
    server.request(&client, &["SET", "ghost", "1"]);
    server.request(&client, &["DISCARD"]);
    server.request(&client, &["GET", "ghost"]);

    client.expect_reply(simple("OK"));
    client.expect_reply(simple("QUEUED"));
    client.expect_reply(simple("OK"));
    client.expect_reply(RespValue::Null);
}

#[tokio::test]
async fn test_pub_sub_delivery() {
    let mut server = TestServer::new();
    let mut subscriber = server.connect(1);
    let mut publisher = server.connect(2);

    server.request(&subscriber, &["SUBSCRIBE", "news"]);
    subscriber.expect_reply(RespValue::Array(vec![
        bulk("subscribe"),
        bulk("news"),
        RespValue::Integer(1),
    ]));

    server.request(&publisher, &["PUBLISH", "news", "hello"]);
    publisher.expect_reply(RespValue::Integer(1));
    subscriber.expect_reply(bulk_array(&["message", "news", "hello"]));

    // Unsubscribing the last channel returns the connection to standard mode.
    server.request(&subscriber, &["UNSUBSCRIBE", "news"]);
    subscriber.expect_reply(RespValue::Array(vec![
        bulk("unsubscribe"),
        bulk("news"),
        RespValue::Integer(0),
    ]));

    server.request(&subscriber, &["GET", "k"]);
    subscriber.expect_reply(RespValue::Null);

    server.request(&publisher, &["PUBLISH", "news", "nobody"]);
    publisher.expect_reply(RespValue::Integer(0));
    subscriber.expect_no_reply();
}

#[tokio::test]
async fn test_subscriber_disconnect_stops_delivery() {
    let mut server = TestServer::new();
    let subscriber = server.connect(1);
    let mut publisher = server.connect(2);

    server.request(&subscriber, &["SUBSCRIBE", "news"]);
    server.disconnect(&subscriber);

    server.request(&publisher, &["PUBLISH", "news", "gone"]);
    publisher.expect_reply(RespValue::Integer(0));
}

#[tokio::test]
async fn test_per_connection_response_order() {
    let mut server = TestServer::new();
    let mut client = server.connect(1);

    for i in 0..50 {
        server.request(&client, &["RPUSH", "ordered", &format!("v{}", i)]);
    }
    for i in 0..50u32 {
        client.expect_reply(RespValue::Integer(i as i64 + 1));
    }
    client.expect_no_reply();
}
