//! Scripted in-memory transport for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::address::Address;
use crate::error::FetchError;
use crate::transport::Transport;

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: RefCell<HashMap<Address, Result<Value, FetchError>>>,
    delays: RefCell<HashMap<Address, usize>>,
    requests: RefCell<Vec<Address>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, address: Address, value: Value) {
        self.responses.borrow_mut().insert(address, Ok(value));
    }

    pub(crate) fn fail(&self, address: Address, status: u16) {
        let error = FetchError::Status {
            address: address.clone(),
            status,
        };
        self.responses.borrow_mut().insert(address, Err(error));
    }

    /// Hold the response back for `yields` scheduler turns.
    pub(crate) fn delay(&self, address: Address, yields: usize) {
        self.delays.borrow_mut().insert(address, yields);
    }

    pub(crate) fn requests(&self) -> Vec<Address> {
        self.requests.borrow().clone()
    }

    pub(crate) fn request_count(&self, address: &Address) -> usize {
        self.requests.borrow().iter().filter(|a| *a == address).count()
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn get_json(&self, address: &Address) -> Result<Value, FetchError> {
        self.requests.borrow_mut().push(address.clone());

        let yields = self.delays.borrow().get(address).copied().unwrap_or(0);
        for _ in 0..yields {
            tokio::task::yield_now().await;
        }

        self.responses
            .borrow()
            .get(address)
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::Network {
                    address: address.clone(),
                    message: "no scripted response".to_string(),
                })
            })
    }
}
