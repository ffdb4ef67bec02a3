use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::address::{ApiRoot, DEFAULT_API_VERSION, DEFAULT_BASE_URL};
use crate::batch::DEFAULT_GROUP_SIZE;

pub const DEFAULT_USER: &str = "simonpure";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub api_version: String,
    /// Addresses fetched concurrently per group.
    pub group_size: usize,
    pub user_agent: String,
    /// Per-request timeout. `None` lets a hung request stall its group.
    pub request_timeout: Option<Duration>,
    pub default_user: String,
    pub default_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            group_size: DEFAULT_GROUP_SIZE,
            user_agent: concat!("hn-blog/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: None,
            default_user: DEFAULT_USER.to_string(),
            default_filter: String::new(),
        }
    }
}

impl Config {
    /// Defaults overlaid with `HN_BLOG_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup("HN_BLOG_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(version) = lookup("HN_BLOG_API_VERSION") {
            config.api_version = version;
        }
        if let Some(size) = parse_var::<usize>(&lookup, "HN_BLOG_GROUP_SIZE") {
            config.group_size = size;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "HN_BLOG_TIMEOUT_SECS") {
            config.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(user) = lookup("HN_BLOG_USER") {
            config.default_user = user;
        }
        if let Some(filter) = lookup("HN_BLOG_FILTER") {
            config.default_filter = filter;
        }

        config
    }

    pub fn api_root(&self) -> ApiRoot {
        ApiRoot::new(&self.base_url, &self.api_version)
    }

    /// Group size clamped to at least one address per group.
    pub fn effective_group_size(&self) -> usize {
        self.group_size.max(1)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable configuration value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_public_api() {
        let config = Config::default();
        assert_eq!(config.group_size, 100);
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.default_user, "simonpure");
        assert_eq!(
            config.api_root().item(1).as_str(),
            "https://hacker-news.firebaseio.com/v0/item/1.json"
        );
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("HN_BLOG_BASE_URL", "http://127.0.0.1:9000"),
            ("HN_BLOG_GROUP_SIZE", "25"),
            ("HN_BLOG_TIMEOUT_SECS", "10"),
            ("HN_BLOG_USER", "pg"),
            ("HN_BLOG_FILTER", "Ask"),
        ]));
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.group_size, 25);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.default_user, "pg");
        assert_eq!(config.default_filter, "Ask");
        assert_eq!(config.api_version, "v0");
    }

    #[test]
    fn unparsable_numbers_are_ignored() {
        let config = Config::from_lookup(lookup(&[("HN_BLOG_GROUP_SIZE", "lots")]));
        assert_eq!(config.group_size, 100);
    }

    #[test]
    fn zero_group_size_is_clamped() {
        let config = Config {
            group_size: 0,
            ..Config::default()
        };
        assert_eq!(config.effective_group_size(), 1);
    }
}
