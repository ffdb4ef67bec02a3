use crate::models::Item;

/// Decides which fetched submissions count as stories: a non-empty title,
/// optionally starting with a case-sensitive prefix. An empty prefix accepts
/// every titled item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleFilter {
    prefix: String,
}

impl TitleFilter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Accepts every titled item.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn accepts(&self, item: &Item) -> bool {
        match item.title() {
            Some(title) if !title.is_empty() => title.starts_with(&self.prefix),
            _ => false,
        }
    }

    /// Accepted items, in input order.
    pub fn apply<'a, I>(&self, items: I) -> Vec<Item>
    where
        I: IntoIterator<Item = &'a Item>,
    {
        items
            .into_iter()
            .filter(|item| self.accepts(item))
            .cloned()
            .collect()
    }
}
