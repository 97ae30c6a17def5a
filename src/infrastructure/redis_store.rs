use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, RedisError, Script};

use crate::domain::store::{Batch, KeyValueStore, StoreError, WriteOp};

// HSET that refuses to create the key. Replies -1 when the key is absent.
const HSET_EXISTING: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return -1
end
return redis.call('HSET', KEYS[1], unpack(ARGV))
"#;

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    hset_existing: Script,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).with_context(|| format!("invalid redis url {redis_url}"))?;
        let conn = ConnectionManager::new(client)
            .await
            .with_context(|| format!("failed to connect to redis at {redis_url}"))?;
        Ok(Self { conn, hset_existing: Script::new(HSET_EXISTING) })
    }
}

fn store_error(err: RedisError) -> StoreError {
    if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() || err.is_timeout() {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Command(err.to_string())
    }
}

fn write_cmd(op: &WriteOp) -> redis::Cmd {
    match op {
        WriteOp::HSet { key, fields } => {
            let mut cmd = redis::cmd("HSET");
            cmd.arg(key);
            for (field, value) in fields {
                cmd.arg(field).arg(value);
            }
            cmd
        }
        WriteOp::RPush { key, value } => redis::cmd("RPUSH").arg(key).arg(value).clone(),
        WriteOp::LRem { key, count, value } => redis::cmd("LREM").arg(key).arg(*count).arg(value).clone(),
        WriteOp::Del { key } => redis::cmd("DEL").arg(key).clone(),
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await.map_err(store_error)?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("INCR").arg(key).query_async(&mut conn).await.map_err(store_error)
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("HGETALL").arg(key).query_async(&mut conn).await.map_err(store_error)
    }

    async fn hset_existing(&self, key: &str, fields: &[(String, String)]) -> Result<Option<i64>, StoreError> {
        let mut conn = self.conn.clone();
        let mut invocation = self.hset_existing.prepare_invoke();
        invocation.key(key);
        for (field, value) in fields {
            invocation.arg(field).arg(value);
        }
        let reply: i64 = invocation.invoke_async(&mut conn).await.map_err(store_error)?;
        Ok((reply >= 0).then_some(reply))
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("LRANGE").arg(key).arg(start).arg(stop).query_async(&mut conn).await.map_err(store_error)
    }

    async fn del(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL").arg(key).query_async(&mut conn).await.map_err(store_error)
    }

    async fn flushdb(&self) -> Result<String, StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("FLUSHDB").query_async(&mut conn).await.map_err(store_error)
    }

    // MULTI/EXEC: no other client interleaves, but a command that fails at
    // run time does not undo the others. Any failed reply fails the whole call.
    async fn exec(&self, batch: Batch) -> Result<Vec<i64>, StoreError> {
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in batch.ops() {
            pipe.add_command(write_cmd(op));
        }
        pipe.query_async(&mut conn).await.map_err(store_error)
    }
}
