use std::borrow::Cow;
use std::rc::Rc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::address::{Address, ApiRoot};
use crate::batch::BatchedFetcher;
use crate::cache::{decode, FetchCache};
use crate::config::Config;
use crate::error::{Error, FetchError, Result};
use crate::filter::TitleFilter;
use crate::models::{Item, ItemId, Updates, User};
use crate::resolver::{Expansion, Reconcile, TreeResolver};
use crate::state::MaterializedState;
use crate::transport::{HttpTransport, Transport};

/// What to load: the submitting user and the title prefix for stories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    pub user: String,
    pub filter: TitleFilter,
}

impl SessionParams {
    pub fn new(user: impl Into<String>, filter: TitleFilter) -> Self {
        Self {
            user: user.into(),
            filter,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.default_user, TitleFilter::new(&config.default_filter))
    }

    /// Parse `user` and `filter` out of a query string such as
    /// `?user=pg&filter=Ask%20HN`. Absent keys fall back to the config defaults.
    pub fn from_query(query: &str, config: &Config) -> Self {
        let mut params = Self::from_config(config);

        for pair in query.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode_component(value);
            match key {
                "user" if !value.is_empty() => params.user = value.into_owned(),
                "filter" => params.filter = TitleFilter::new(value),
                _ => {}
            }
        }

        params
    }
}

// Percent-decoding with `+` as space; undecodable input is taken literally.
fn decode_component(raw: &str) -> Cow<'_, str> {
    if raw.contains('+') {
        let spaced = raw.replace('+', " ");
        return match urlencoding::decode(&spaced) {
            Ok(decoded) => Cow::Owned(decoded.into_owned()),
            Err(_) => Cow::Owned(spaced),
        };
    }

    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub user: String,
    pub stories: usize,
    pub comments: usize,
    pub expansion: Expansion,
}

/// One loading session: the fetch cache, the materialized state and the
/// cancellation token, created together and dropped together.
pub struct Session {
    config: Config,
    api: ApiRoot,
    cache: FetchCache,
    state: MaterializedState,
    user: Option<User>,
    cancel: CancellationToken,
}

impl Session {
    /// Session over HTTP with the configured client options.
    pub fn new(config: Config) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: Config, transport: impl Transport + 'static) -> Self {
        Self::with_shared_transport(config, Rc::new(transport))
    }

    pub fn with_shared_transport(config: Config, transport: Rc<dyn Transport>) -> Self {
        Self {
            api: config.api_root(),
            cache: FetchCache::from_shared(transport),
            state: MaterializedState::new(),
            user: None,
            cancel: CancellationToken::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn api(&self) -> &ApiRoot {
        &self.api
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    pub fn state(&self) -> &MaterializedState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Token checked between comment-tree levels. Cancelling it stops
    /// expansion early; requests already issued still complete.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// End the session, handing back everything that was materialized.
    pub fn dispose(self) -> MaterializedState {
        debug!(items = self.state.len(), "session disposed");
        self.state
    }

    pub async fn load_user(&mut self, id: &str) -> Result<User> {
        let address = self.api.user(id);
        let user: User = self
            .cache
            .resolve_as(&address)
            .await?
            .ok_or_else(|| Error::UnknownUser(id.to_string()))?;

        info!(user = %user.id, submitted = user.submitted.len(), "user loaded");
        self.user = Some(user.clone());
        Ok(user)
    }

    /// Fetch `submitted` in groups and accept the titled ones matching
    /// `filter`. Each group's newly accepted stories go to `sink`. Returns the
    /// number of stories accepted by this call.
    pub async fn load_stories<R>(
        &mut self,
        submitted: &[ItemId],
        filter: &TitleFilter,
        sink: &mut R,
    ) -> Result<usize>
    where
        R: Reconcile + ?Sized,
    {
        let addresses: Vec<Address> = submitted.iter().map(|id| self.api.item(*id)).collect();
        let fetcher = BatchedFetcher::new(&self.cache, self.config.effective_group_size());
        let state = &mut self.state;
        let mut accepted = 0;

        fetcher
            .process_decoded(&addresses, decode::<Item>, |group: &[Option<Item>]| {
                let fresh: Vec<Item> = filter
                    .apply(group.iter().flatten())
                    .into_iter()
                    .filter(|story| state.accept_story(story.clone()))
                    .collect();

                if !fresh.is_empty() {
                    accepted += fresh.len();
                    sink.reconcile(&fresh);
                }
            })
            .await?;

        info!(
            submitted = submitted.len(),
            accepted,
            filter = filter.prefix(),
            "stories loaded"
        );
        Ok(accepted)
    }

    /// Resolve the comment trees below `frontier`.
    pub async fn expand<R>(&mut self, frontier: Vec<Item>, sink: &mut R) -> Result<Expansion>
    where
        R: Reconcile + ?Sized,
    {
        let expansion = TreeResolver::new(&self.cache, &self.api, self.config.effective_group_size())
            .with_cancellation(&self.cancel)
            .expand(frontier, &mut self.state, sink)
            .await?;

        Ok(expansion)
    }

    /// Resolve the comment trees of every accepted story.
    pub async fn expand_stories<R>(&mut self, sink: &mut R) -> Result<Expansion>
    where
        R: Reconcile + ?Sized,
    {
        let frontier: Vec<Item> = self.state.stories().cloned().collect();
        self.expand(frontier, sink).await
    }

    /// Load the user, their stories, then every comment below them.
    pub async fn run<R>(&mut self, params: &SessionParams, sink: &mut R) -> Result<SessionSummary>
    where
        R: Reconcile + ?Sized,
    {
        let user = self.load_user(&params.user).await?;
        let stories = self.load_stories(&user.submitted, &params.filter, &mut *sink).await?;
        let expansion = self.expand_stories(&mut *sink).await?;

        if expansion.cancelled {
            info!(levels = expansion.levels, "session stopped before the comment trees were complete");
        } else {
            info!(
                stories,
                comments = expansion.resolved,
                levels = expansion.levels,
                "session complete"
            );
        }

        Ok(SessionSummary {
            user: user.id,
            stories,
            comments: expansion.resolved,
            expansion,
        })
    }

    pub async fn max_item(&self) -> Result<Option<ItemId>> {
        Ok(self.aggregate(self.api.max_item()).await?)
    }

    pub async fn top_stories(&self) -> Result<Vec<ItemId>> {
        Ok(self.aggregate(self.api.top_stories()).await?.unwrap_or_default())
    }

    pub async fn updates(&self) -> Result<Updates> {
        Ok(self.aggregate(self.api.updates()).await?.unwrap_or_default())
    }

    async fn aggregate<T>(&self, address: Address) -> Result<Option<T>, FetchError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.cache.resolve_as(&address).await
    }
}
