use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{trace, warn};

use crate::address::Address;
use crate::error::FetchError;
use crate::transport::Transport;

type PendingFetch = Shared<LocalBoxFuture<'static, Result<Value, FetchError>>>;

enum Slot {
    Pending(PendingFetch),
    Ready(Value),
}

/// Session-scoped memo of remote lookups keyed by address.
///
/// At most one request per address is in flight at a time: callers arriving
/// while it runs await the same shared future. Resolved values (including
/// `null`) stay for the lifetime of the cache. Failures reach every waiting
/// caller and are dropped, so the next call goes back to the network.
///
/// The cache is single-threaded (`Rc`/`RefCell`); no borrow is held across an
/// await point.
#[derive(Clone)]
pub struct FetchCache {
    transport: Rc<dyn Transport>,
    slots: Rc<RefCell<HashMap<Address, Slot>>>,
    requests: Rc<Cell<usize>>,
}

impl FetchCache {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_shared(Rc::new(transport))
    }

    pub fn from_shared(transport: Rc<dyn Transport>) -> Self {
        Self {
            transport,
            slots: Rc::new(RefCell::new(HashMap::new())),
            requests: Rc::new(Cell::new(0)),
        }
    }

    pub async fn resolve(&self, address: &Address) -> Result<Value, FetchError> {
        let pending = {
            let mut slots = self.slots.borrow_mut();
            let in_flight = match slots.get(address) {
                Some(Slot::Ready(value)) => {
                    trace!(%address, "cache hit");
                    return Ok(value.clone());
                }
                Some(Slot::Pending(fetch)) => {
                    trace!(%address, "joining in-flight request");
                    Some(fetch.clone())
                }
                None => None,
            };

            match in_flight {
                Some(fetch) => fetch,
                None => {
                    let fetch = self.start(address.clone());
                    slots.insert(address.clone(), Slot::Pending(fetch.clone()));
                    fetch
                }
            }
        };

        pending.await
    }

    /// Resolve and decode; `null` decodes to `None`.
    pub async fn resolve_as<T: DeserializeOwned>(
        &self,
        address: &Address,
    ) -> Result<Option<T>, FetchError> {
        let value = self.resolve(address).await?;
        decode(address, value)
    }

    fn start(&self, address: Address) -> PendingFetch {
        self.requests.set(self.requests.get() + 1);

        let transport = Rc::clone(&self.transport);
        let slots = Rc::downgrade(&self.slots);

        async move {
            let result = transport.get_json(&address).await;

            if let Some(slots) = slots.upgrade() {
                let mut slots = slots.borrow_mut();
                match &result {
                    Ok(value) => {
                        slots.insert(address, Slot::Ready(value.clone()));
                    }
                    Err(e) => {
                        warn!(%address, error = %e, "fetch failed");
                        slots.remove(&address);
                    }
                }
            }

            result
        }
        .boxed_local()
        .shared()
    }

    /// Resolved value for `address`, without touching the network.
    pub fn peek(&self, address: &Address) -> Option<Value> {
        match self.slots.borrow().get(address) {
            Some(Slot::Ready(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn is_pending(&self, address: &Address) -> bool {
        matches!(self.slots.borrow().get(address), Some(Slot::Pending(_)))
    }

    /// Number of entries, pending or resolved.
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Network requests issued over the lifetime of the cache.
    pub fn network_requests(&self) -> usize {
        self.requests.get()
    }
}

/// Decode a resolved value into a typed record; `null` means the entity does not exist.
pub fn decode<T: DeserializeOwned>(address: &Address, value: Value) -> Result<Option<T>, FetchError> {
    if value.is_null() {
        return Ok(None);
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| FetchError::Malformed {
            address: address.clone(),
            message: e.to_string(),
        })
}
