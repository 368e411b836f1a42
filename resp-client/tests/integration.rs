//! Integration tests for resp-client against a real Redis server.
//!
//! These tests are `#[ignore]` by default because they require Redis running
//! on 127.0.0.1:6379. Run with:
//!
//! ```sh
//! cargo test -p resp-client --test integration -- --ignored
//! ```
//!
//! Every test uses its own key prefix so they can run in parallel.

use resp_client::commands::{SetOptions, XAddOptions, XReadGroupOptions};
use resp_client::stream::XIdArg;
use resp_client::{Client, Error, Request, TcpConnection, Value};

// ── Helpers ─────────────────────────────────────────────────────────────

const REDIS_ADDR: &str = "127.0.0.1:6379";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn connect() -> Result<Client<TcpConnection>, String> {
    init_tracing();
    Client::connect(TcpConnection::new(REDIS_ADDR))
        .await
        .map_err(|e| format!("connect: {e}"))
}

async fn cleanup(client: &mut Client<TcpConnection>, keys: &[&str]) -> Result<(), String> {
    client
        .del(keys)
        .await
        .map(|_| ())
        .map_err(|e| format!("cleanup: {e}"))
}

// ── Tests ───────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore]
async fn ping() -> Result<(), String> {
    let mut client = connect().await?;
    client.ping().await.map_err(|e| format!("ping: {e}"))
}

#[tokio::test]
#[ignore]
async fn set_get_del() -> Result<(), String> {
    let mut client = connect().await?;
    let key = "resp-client-test:basic";

    client.set(key, "hello").await.map_err(|e| format!("set: {e}"))?;
    let val = client.get(key).await.map_err(|e| format!("get: {e}"))?;
    if val.as_deref() != Some(&b"hello"[..]) {
        return Err(format!("get: expected hello, got {val:?}"));
    }

    let skipped = client
        .set_with(key, "other", &SetOptions::new().nx())
        .await
        .map_err(|e| format!("set nx: {e}"))?;
    if skipped.is_some() {
        return Err(format!("set nx: expected skip, got {skipped:?}"));
    }

    let n = client.del([key]).await.map_err(|e| format!("del: {e}"))?;
    if n != 1 {
        return Err(format!("del: expected 1, got {n}"));
    }
    let val = client.get(key).await.map_err(|e| format!("get after del: {e}"))?;
    if val.is_some() {
        return Err(format!("get after del: expected nil, got {val:?}"));
    }
    Ok(())
}

#[tokio::test]
#[ignore]
async fn incr_decr() -> Result<(), String> {
    let mut client = connect().await?;
    let key = "resp-client-test:counter";
    cleanup(&mut client, &[key]).await?;

    let n = client.incr(key).await.map_err(|e| format!("incr: {e}"))?;
    if n != 1 {
        return Err(format!("incr: expected 1, got {n}"));
    }
    let n = client.incrby(key, 9).await.map_err(|e| format!("incrby: {e}"))?;
    if n != 10 {
        return Err(format!("incrby: expected 10, got {n}"));
    }
    let n = client.decr(key).await.map_err(|e| format!("decr: {e}"))?;
    if n != 9 {
        return Err(format!("decr: expected 9, got {n}"));
    }

    client.set(key, "not-a-number").await.map_err(|e| format!("set: {e}"))?;
    match client.incr(key).await {
        Err(Error::Redis { command, .. }) if command == "INCR" => {}
        other => return Err(format!("incr on text: expected Redis error, got {other:?}")),
    }
    cleanup(&mut client, &[key]).await
}

#[tokio::test]
#[ignore]
async fn hash_ops() -> Result<(), String> {
    let mut client = connect().await?;
    let key = "resp-client-test:hash";
    cleanup(&mut client, &[key]).await?;

    let added = client
        .hset(key, [("f1", "v1"), ("f2", "v2")])
        .await
        .map_err(|e| format!("hset: {e}"))?;
    if added != 2 {
        return Err(format!("hset: expected 2, got {added}"));
    }
    let val = client.hget(key, "f1").await.map_err(|e| format!("hget: {e}"))?;
    if val.as_deref() != Some(&b"v1"[..]) {
        return Err(format!("hget: expected v1, got {val:?}"));
    }
    let mut all = client.hgetall(key).await.map_err(|e| format!("hgetall: {e}"))?;
    all.sort();
    if all.len() != 2 || all[1].0 != "f2" || all[1].1 != "v2" {
        return Err(format!("hgetall: unexpected {all:?}"));
    }
    cleanup(&mut client, &[key]).await
}

#[tokio::test]
#[ignore]
async fn list_ops() -> Result<(), String> {
    let mut client = connect().await?;
    let key = "resp-client-test:list";
    cleanup(&mut client, &[key]).await?;

    client
        .rpush(key, ["a", "b", "c"])
        .await
        .map_err(|e| format!("rpush: {e}"))?;
    let items = client.lrange(key, 0, -1).await.map_err(|e| format!("lrange: {e}"))?;
    if items != ["a", "b", "c"] {
        return Err(format!("lrange: unexpected {items:?}"));
    }
    let head = client.lpop(key).await.map_err(|e| format!("lpop: {e}"))?;
    if head.as_deref() != Some(&b"a"[..]) {
        return Err(format!("lpop: expected a, got {head:?}"));
    }
    let len = client.llen(key).await.map_err(|e| format!("llen: {e}"))?;
    if len != 2 {
        return Err(format!("llen: expected 2, got {len}"));
    }
    cleanup(&mut client, &[key]).await
}

#[tokio::test]
#[ignore]
async fn set_ops() -> Result<(), String> {
    let mut client = connect().await?;
    let key = "resp-client-test:set";
    cleanup(&mut client, &[key]).await?;

    let added = client
        .sadd(key, ["x", "y", "x"])
        .await
        .map_err(|e| format!("sadd: {e}"))?;
    if added != 2 {
        return Err(format!("sadd: expected 2, got {added}"));
    }
    let yes = client.sismember(key, "y").await.map_err(|e| format!("sismember: {e}"))?;
    if !yes {
        return Err("sismember: expected true".into());
    }
    let card = client.scard(key).await.map_err(|e| format!("scard: {e}"))?;
    if card != 2 {
        return Err(format!("scard: expected 2, got {card}"));
    }
    cleanup(&mut client, &[key]).await
}

#[tokio::test]
#[ignore]
async fn pipeline() -> Result<(), String> {
    let mut client = connect().await?;
    let key = "resp-client-test:pipeline";
    cleanup(&mut client, &[key]).await?;

    let results = client
        .pipeline()
        .cmd(&Request::cmd(b"SET").arg(key.as_bytes()).arg(b"1"))
        .cmd(&Request::cmd(b"LPUSH").arg(key.as_bytes()).arg(b"x"))
        .cmd(&Request::cmd(b"INCR").arg(key.as_bytes()))
        .execute()
        .await
        .map_err(|e| format!("pipeline: {e}"))?;

    if results.len() != 3 {
        return Err(format!("pipeline: expected 3 results, got {}", results.len()));
    }
    if !matches!(results[1], Err(Error::Redis { .. })) {
        return Err(format!("pipeline: expected WRONGTYPE in slot 1, got {:?}", results[1]));
    }
    match &results[2] {
        Ok(Value::Integer(2)) => {}
        other => return Err(format!("pipeline: expected 2 in slot 2, got {other:?}")),
    }
    cleanup(&mut client, &[key]).await
}

#[tokio::test]
#[ignore]
async fn transaction() -> Result<(), String> {
    let mut client = connect().await?;
    let key = "resp-client-test:tx";
    cleanup(&mut client, &[key]).await?;

    let results = client
        .transaction()
        .cmd(&Request::cmd(b"INCR").arg(key.as_bytes()))
        .cmd(&Request::cmd(b"INCR").arg(key.as_bytes()))
        .execute()
        .await
        .map_err(|e| format!("transaction: {e}"))?;
    let counts: Vec<_> = results
        .into_iter()
        .map(|r| r.map_err(|e| format!("transaction slot: {e}")))
        .collect::<Result<_, _>>()?;
    if counts != [Value::Integer(1), Value::Integer(2)] {
        return Err(format!("transaction: unexpected {counts:?}"));
    }
    cleanup(&mut client, &[key]).await
}

#[tokio::test]
#[ignore]
async fn stream_consumer_group() -> Result<(), String> {
    let mut client = connect().await?;
    let key = "resp-client-test:stream";
    cleanup(&mut client, &[key]).await?;

    let mut ids = Vec::new();
    for n in 0..3 {
        let id = client
            .xadd(key, &XIdArg::Auto, [("n", n.to_string())], &XAddOptions::default())
            .await
            .map_err(|e| format!("xadd: {e}"))?
            .ok_or("xadd: expected an id")?;
        ids.push(id);
    }

    let entries = client
        .xrange(key, &XIdArg::Min, &XIdArg::Max, None)
        .await
        .map_err(|e| format!("xrange: {e}"))?;
    let seen: Vec<_> = entries.iter().map(|m| m.id).collect();
    if seen != ids {
        return Err(format!("xrange: expected {ids:?}, got {seen:?}"));
    }
    if entries[2].get("n") != Some("2") {
        return Err(format!("xrange: unexpected fields {:?}", entries[2].fields));
    }

    client
        .xgroup_create(key, "workers", &XIdArg::Millis(0), false, None)
        .await
        .map_err(|e| format!("xgroup create: {e}"))?;
    let streams = client
        .xreadgroup(
            "workers",
            "w1",
            &XReadGroupOptions {
                count: Some(2),
                ..Default::default()
            },
            &[(key, XIdArg::New)],
        )
        .await
        .map_err(|e| format!("xreadgroup: {e}"))?;
    let delivered: Vec<_> = streams
        .iter()
        .flat_map(|s| s.messages.iter().map(|m| m.id))
        .collect();
    if delivered != ids[..2] {
        return Err(format!("xreadgroup: expected {:?}, got {delivered:?}", &ids[..2]));
    }

    let summary = client
        .xpending_summary(key, "workers")
        .await
        .map_err(|e| format!("xpending: {e}"))?;
    if summary.count != 2 || summary.start != Some(ids[0]) {
        return Err(format!("xpending: unexpected {summary:?}"));
    }

    let acked = client
        .xack(key, "workers", delivered)
        .await
        .map_err(|e| format!("xack: {e}"))?;
    if acked != 2 {
        return Err(format!("xack: expected 2, got {acked}"));
    }
    cleanup(&mut client, &[key]).await
}

#[tokio::test]
#[ignore]
async fn publish_subscribe() -> Result<(), String> {
    let subscriber = connect().await?;
    let mut publisher = connect().await?;
    let channel = "resp-client-test:channel";

    let mut sub = subscriber
        .subscribe([channel])
        .await
        .map_err(|e| format!("subscribe: {e}"))?;

    // Wait until the server has registered the subscription.
    loop {
        let n = publisher
            .publish(channel, "hello")
            .await
            .map_err(|e| format!("publish: {e}"))?;
        if n > 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let msg = sub
        .next_message()
        .await
        .map_err(|e| format!("next_message: {e}"))?
        .ok_or("next_message: subscription ended early")?;
    if msg.channel != channel || msg.payload != "hello" {
        return Err(format!("next_message: unexpected {msg:?}"));
    }

    sub.unsubscribe::<&str>([])
        .await
        .map_err(|e| format!("unsubscribe: {e}"))?;
    while sub
        .next_message()
        .await
        .map_err(|e| format!("drain: {e}"))?
        .is_some()
    {}
    let mut client = sub
        .into_client()
        .map_err(|_| "into_client: subscriptions still active".to_string())?;
    client.ping().await.map_err(|e| format!("ping after unsubscribe: {e}"))
}
