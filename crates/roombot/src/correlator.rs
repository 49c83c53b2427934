//! Request/response correlation.
//!
//! Every outbound request carries a random `rid`. The server echoes it on the
//! matching response, which the listen loop hands to [`Correlator::resolve_pending`]
//! instead of yielding it as an event.
//!
//! There is no timeout and no retransmission: a waiter whose response never
//! arrives stays pending until the connection is torn down, the inbound
//! stream ends, or its [`Waiter`] is dropped.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::ConnectionError;

/// Wire field carrying the correlation id.
pub const RID_FIELD: &str = "rid";

/// Fresh correlation id: 16 random bytes, hex-encoded.
///
/// Collisions are treated as negligible; there is no retry.
pub fn generate_rid() -> String {
    format!("{:032x}", fastrand::u128(..))
}

/// Correlation id of an inbound message, if it has one.
pub fn rid_of(message: &Value) -> Option<&str> {
    message.get(RID_FIELD).and_then(Value::as_str)
}

/// Map from correlation id to the sending half of its waiter.
///
/// A slot stays in the map until its [`Waiter`] is dropped; a resolved slot
/// holds `None`.
#[derive(Default)]
pub struct Correlator {
    pending: DashMap<String, Option<oneshot::Sender<Value>>>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiter for `rid`.
    ///
    /// Fails if `rid` is already registered.
    pub fn register(&self, rid: &str) -> Result<Waiter<'_>, ConnectionError> {
        let rx = match self.pending.entry(rid.to_string()) {
            Entry::Occupied(_) => return Err(ConnectionError::DuplicateRid(rid.to_string())),
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                slot.insert(Some(tx));
                rx
            }
        };

        Ok(Waiter {
            correlator: self,
            rid: rid.to_string(),
            rx,
        })
    }

    /// Deliver `message` if a waiter is registered for `rid` and unresolved.
    ///
    /// Hands the message back when nothing is waiting, so the caller can treat
    /// it as an event.
    pub fn resolve_pending(&self, rid: &str, message: Value) -> Option<Value> {
        let tx = self.pending.get_mut(rid).and_then(|mut slot| slot.take());

        match tx {
            Some(tx) => {
                // The waiter may have given up; that is not an error here.
                let _ = tx.send(message);
                None
            }
            None => {
                debug!(rid, "no waiter for response");
                Some(message)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every slot. Outstanding waiters complete with
    /// [`ConnectionError::Closed`].
    pub fn clear(&self) {
        self.pending.clear();
    }
}

/// The waiting side of one pending request.
///
/// Dropping it (after resolution or on cancellation) releases the slot.
pub struct Waiter<'a> {
    correlator: &'a Correlator,
    rid: String,
    rx: oneshot::Receiver<Value>,
}

impl Waiter<'_> {
    pub fn rid(&self) -> &str {
        &self.rid
    }

    /// Suspend until the response arrives. No timeout is applied.
    pub async fn wait(mut self) -> Result<Value, ConnectionError> {
        (&mut self.rx).await.map_err(|_| ConnectionError::Closed)
    }
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        self.correlator.pending.remove(&self.rid);
    }
}
