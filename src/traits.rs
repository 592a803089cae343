//! The session contract both storage backends satisfy.

use anyhow::Result;
use async_trait::async_trait;

use crate::item::SessionItem;

/// Ordered conversation-history storage for one session.
///
/// An agent runtime reads history through [`get_items`](Session::get_items)
/// before generating a response and appends the new turn with
/// [`add_items`](Session::add_items) afterward. Every call is delegated whole
/// to the one backend the session was constructed over; the trait itself
/// holds no state and no locks.
///
/// A session with nothing stored is indistinguishable from one that was
/// cleared or expired: reads return empty, pops return `None`, and clears
/// succeed silently.
#[async_trait]
pub trait Session: Send + Sync {
    /// The opaque identifier this session's history is keyed by.
    fn session_id(&self) -> &str;

    /// Retrieve stored items, oldest first.
    ///
    /// `None` returns the full history. `Some(n)` returns the last `n` items
    /// (still oldest-first among those); `n` larger than the stored count
    /// returns everything, and `Some(0)` returns nothing. Never mutates
    /// stored data.
    async fn get_items(&self, limit: Option<usize>) -> Result<Vec<SessionItem>>;

    /// Append items to the end of the history, in input order.
    ///
    /// An empty batch is a no-op and issues no round trip.
    async fn add_items(&self, items: Vec<SessionItem>) -> Result<()>;

    /// Remove and return the most recently appended item.
    ///
    /// `Ok(None)` when the session is empty — an empty session is never an
    /// error.
    async fn pop_item(&self) -> Result<Option<SessionItem>>;

    /// Delete this session's stored record outright.
    ///
    /// Idempotent: clearing an empty or never-created session succeeds.
    async fn clear_session(&self) -> Result<()>;

    /// Release any resources the session itself opened.
    ///
    /// The backend client is supplied and owned by the caller, so this is a
    /// no-op for every backend in this crate; closing the client is the
    /// caller's responsibility.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
