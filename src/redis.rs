//! Redis-backed session storage: one list-valued key per session.

use anyhow::Result;
use async_trait::async_trait;
use redis::aio::ConnectionLike;
use redis::AsyncCommands;

use crate::item::SessionItem;
use crate::traits::Session;

/// Key prefix used when the caller does not configure one.
pub const DEFAULT_KEY_PREFIX: &str = "agent_sessions";

/// Session storage backed by a Redis list.
///
/// Each session occupies a single list key `"<prefix>:<session_id>"` whose
/// elements are JSON-encoded items in conversation order. Appends and pops
/// map to single native list commands, so they stay atomic under concurrent
/// writers to the same session.
///
/// The connection is supplied by the caller and cloned per operation; with
/// the default [`redis::aio::ConnectionManager`] clones share one multiplexed
/// connection, so a `RedisSession` is cheap to hold and `Send + Sync`.
///
/// # Example
///
/// ```no_run
/// use agent_sessions::{RedisSession, Session, SessionItem};
///
/// # async fn run() -> anyhow::Result<()> {
/// let client = redis::Client::open("redis://127.0.0.1:6379/")?;
/// let connection = client.get_connection_manager().await?;
///
/// let session = RedisSession::new("user-123", connection).with_ttl(3600);
/// session
///     .add_items(vec![SessionItem::message("user", "Hello")])
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct RedisSession<C = redis::aio::ConnectionManager> {
    session_id: String,
    connection: C,
    key_prefix: String,
    ttl: Option<u64>,
}

impl<C> RedisSession<C> {
    /// Binds a session id to a caller-supplied connection. No I/O happens
    /// until the first operation; the key is created lazily by Redis.
    pub fn new(session_id: impl Into<String>, connection: C) -> Self {
        Self {
            session_id: session_id.into(),
            connection,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            ttl: None,
        }
    }

    /// Overrides the key prefix. Sessions created with different prefixes
    /// never collide even for equal session ids.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Expires the session `seconds` after its last read or write.
    #[must_use]
    pub fn with_ttl(mut self, seconds: u64) -> Self {
        self.ttl = Some(seconds);
        self
    }

    /// Full Redis key this session reads and writes.
    pub fn key(&self) -> String {
        format!("{}:{}", self.key_prefix, self.session_id)
    }
}

impl<C> RedisSession<C>
where
    C: ConnectionLike + Clone + Send + Sync,
{
    async fn refresh_ttl(&self, connection: &mut C) -> Result<()> {
        if let Some(seconds) = self.ttl {
            let _: bool = connection.expire(self.key(), seconds as i64).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<C> Session for RedisSession<C>
where
    C: ConnectionLike + Clone + Send + Sync,
{
    fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn get_items(&self, limit: Option<usize>) -> Result<Vec<SessionItem>> {
        // A negated zero offset would address the whole list, so the empty
        // suffix never reaches Redis.
        if limit == Some(0) {
            return Ok(Vec::new());
        }
        let key = self.key();
        let mut connection = self.connection.clone();
        let raw: Vec<String> = match limit {
            Some(n) => connection.lrange(&key, -(n as isize), -1).await?,
            None => connection.lrange(&key, 0, -1).await?,
        };
        self.refresh_ttl(&mut connection).await?;
        raw.iter()
            .map(|data| SessionItem::from_json(data).map_err(Into::into))
            .collect()
    }

    async fn add_items(&self, items: Vec<SessionItem>) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        // Encode the whole batch up front so an unserializable item cannot
        // leave a partial append behind.
        let encoded = items
            .iter()
            .map(SessionItem::to_json)
            .collect::<Result<Vec<_>, _>>()?;
        let key = self.key();
        let mut connection = self.connection.clone();
        let _: i64 = connection.rpush(&key, encoded).await?;
        self.refresh_ttl(&mut connection).await?;
        tracing::debug!(
            session_id = %self.session_id,
            count = items.len(),
            "appended session items"
        );
        Ok(())
    }

    async fn pop_item(&self) -> Result<Option<SessionItem>> {
        let key = self.key();
        let mut connection = self.connection.clone();
        let raw: Option<String> = connection.rpop(&key, None).await?;
        self.refresh_ttl(&mut connection).await?;
        match raw {
            Some(data) => Ok(Some(SessionItem::from_json(&data)?)),
            None => Ok(None),
        }
    }

    async fn clear_session(&self) -> Result<()> {
        let key = self.key();
        let mut connection = self.connection.clone();
        let _: i64 = connection.del(&key).await?;
        tracing::debug!(session_id = %self.session_id, "cleared session");
        Ok(())
    }
}
