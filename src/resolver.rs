use std::collections::HashSet;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::address::{Address, ApiRoot};
use crate::batch::BatchedFetcher;
use crate::cache::{decode, FetchCache};
use crate::error::FetchError;
use crate::models::Item;
use crate::state::MaterializedState;

/// Receives every group of newly resolved items, exactly once per item, in
/// the order their group produced them. Never called with an empty slice.
pub trait Reconcile {
    fn reconcile(&mut self, items: &[Item]);
}

impl<F> Reconcile for F
where
    F: FnMut(&[Item]),
{
    fn reconcile(&mut self, items: &[Item]) {
        self(items)
    }
}

/// Outcome of one [`TreeResolver::expand`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Depth levels that fetched at least one child.
    pub levels: usize,
    /// Items newly materialized.
    pub resolved: usize,
    /// Child ids that resolved to `null`.
    pub missing: usize,
    /// Stopped early by the cancellation token.
    pub cancelled: bool,
}

/// Walks comment trees breadth-first, one depth level at a time, until no
/// item in the frontier has unseen children.
pub struct TreeResolver<'a> {
    fetcher: BatchedFetcher<'a>,
    api: &'a ApiRoot,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> TreeResolver<'a> {
    pub fn new(cache: &'a FetchCache, api: &'a ApiRoot, group_size: usize) -> Self {
        Self {
            fetcher: BatchedFetcher::new(cache, group_size),
            api,
            cancel: None,
        }
    }

    /// Check `token` before each depth level starts.
    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Expand `frontier` level by level. Level n, including its reconciliation
    /// calls, completes before level n + 1 starts fetching. Children already in
    /// `state` are neither fetched nor announced again.
    pub async fn expand<R>(
        &self,
        frontier: Vec<Item>,
        state: &mut MaterializedState,
        sink: &mut R,
    ) -> Result<Expansion, FetchError>
    where
        R: Reconcile + ?Sized,
    {
        let mut report = Expansion::default();
        let mut frontier = frontier;

        while !frontier.is_empty() {
            if self.cancel.is_some_and(CancellationToken::is_cancelled) {
                info!(levels = report.levels, "comment expansion cancelled");
                report.cancelled = true;
                break;
            }

            let addresses = self.child_addresses(&frontier, state);
            if addresses.is_empty() {
                break;
            }

            report.levels += 1;
            debug!(depth = report.levels, children = addresses.len(), "expanding level");

            let mut next = Vec::new();
            let mut missing = 0;
            self.fetcher
                .process_decoded(&addresses, decode::<Item>, |group: &[Option<Item>]| {
                    let mut fresh = Vec::with_capacity(group.len());
                    for resolved in group {
                        match resolved {
                            Some(item) => {
                                if state.insert(item.clone()) {
                                    fresh.push(item.clone());
                                }
                            }
                            None => missing += 1,
                        }
                    }

                    if !fresh.is_empty() {
                        sink.reconcile(&fresh);
                        next.extend(fresh);
                    }
                })
                .await?;

            report.resolved += next.len();
            report.missing += missing;
            frontier = next;
        }

        debug!(?report, "comment expansion finished");
        Ok(report)
    }

    // Unseen children of the frontier, parent by parent, each id once.
    fn child_addresses(&self, frontier: &[Item], state: &MaterializedState) -> Vec<Address> {
        let mut seen = HashSet::new();
        frontier
            .iter()
            .flat_map(|item| item.kids().iter().copied())
            .filter(|id| !state.contains(*id) && seen.insert(*id))
            .map(|id| self.api.item(id))
            .collect()
    }
}
