use futures::future::try_join_all;
use serde_json::Value;
use tracing::debug;

use crate::address::Address;
use crate::cache::FetchCache;
use crate::error::FetchError;

pub const DEFAULT_GROUP_SIZE: usize = 100;

/// Fetches address lists in fixed-size groups: groups run one after another,
/// the addresses inside a group run concurrently through the cache. Peak
/// outstanding requests are bounded by the group size.
pub struct BatchedFetcher<'a> {
    cache: &'a FetchCache,
    group_size: usize,
}

impl<'a> BatchedFetcher<'a> {
    pub fn new(cache: &'a FetchCache, group_size: usize) -> Self {
        Self {
            cache,
            group_size: group_size.max(1),
        }
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Fetch `addresses`, calling `on_group` with each group's values (in input
    /// order) before the next group starts. Returns all values in input order.
    pub async fn process<F>(&self, addresses: &[Address], on_group: F) -> Result<Vec<Value>, FetchError>
    where
        F: FnMut(&[Value]),
    {
        self.process_decoded(addresses, |_, value| Ok(value), on_group)
            .await
    }

    /// Like [`process`](Self::process), with every value passed through `decode`
    /// before the group is handed to `on_group`. A failed fetch or decode fails
    /// the whole call; groups already delivered stay delivered.
    pub async fn process_decoded<T, D, F>(
        &self,
        addresses: &[Address],
        mut decode: D,
        mut on_group: F,
    ) -> Result<Vec<T>, FetchError>
    where
        D: FnMut(&Address, Value) -> Result<T, FetchError>,
        F: FnMut(&[T]),
    {
        let mut results = Vec::with_capacity(addresses.len());

        for (index, group) in addresses.chunks(self.group_size).enumerate() {
            debug!(group = index, size = group.len(), "fetching group");

            let values = try_join_all(group.iter().map(|address| self.cache.resolve(address))).await?;

            let decoded = group
                .iter()
                .zip(values)
                .map(|(address, value)| decode(address, value))
                .collect::<Result<Vec<_>, _>>()?;

            on_group(&decoded);
            results.extend(decoded);
        }

        Ok(results)
    }
}
