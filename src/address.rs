use std::fmt;

use crate::models::ItemId;

pub const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com";
pub const DEFAULT_API_VERSION: &str = "v0";

/// Kind of entity an address points at. Aggregate endpoints (`maxitem`,
/// `topstories`, `updates`) have no entity segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Item,
    User,
}

impl Entity {
    fn segment(self) -> &'static str {
        match self {
            Entity::Item => "item",
            Entity::User => "user",
        }
    }
}

/// Opaque key for one remote resource. Two addresses are equal exactly when
/// they name the same resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Root of the item-graph API: `BASE/VERSION/{entity?}/{id}.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRoot {
    base: String,
    version: String,
}

impl Default for ApiRoot {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_API_VERSION)
    }
}

impl ApiRoot {
    pub fn new(base: impl Into<String>, version: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        let version = version.into().trim_matches('/').to_string();
        Self { base, version }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Pure mapping from (entity, id) to an address.
    pub fn address(&self, entity: Option<Entity>, id: impl fmt::Display) -> Address {
        match entity {
            Some(entity) => Address(format!(
                "{}/{}/{}/{}.json",
                self.base,
                self.version,
                entity.segment(),
                id
            )),
            None => Address(format!("{}/{}/{}.json", self.base, self.version, id)),
        }
    }

    pub fn item(&self, id: ItemId) -> Address {
        self.address(Some(Entity::Item), id)
    }

    pub fn user(&self, id: &str) -> Address {
        self.address(Some(Entity::User), urlencoding::encode(id))
    }

    pub fn max_item(&self) -> Address {
        self.address(None, "maxitem")
    }

    pub fn top_stories(&self) -> Address {
        self.address(None, "topstories")
    }

    pub fn updates(&self) -> Address {
        self.address(None, "updates")
    }
}
