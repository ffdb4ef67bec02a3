//! Incremental loader for a Hacker News user's submissions.
//!
//! A [`Session`] fetches the user's submitted items through a deduplicating
//! [`FetchCache`], keeps the titled ones as stories, then walks every comment
//! tree level by level. Each group of newly resolved items is handed to a
//! [`Reconcile`] sink as soon as it arrives, so a front end can draw only what
//! is new.
//!
//! ```no_run
//! use hn_blog::{Config, Item, Session, SessionParams};
//!
//! # async fn demo() -> Result<(), hn_blog::Error> {
//! let config = Config::default();
//! let params = SessionParams::from_query("?user=pg&filter=Ask", &config);
//! let mut session = Session::new(config)?;
//! session
//!     .run(&params, &mut |items: &[Item]| println!("{} new items", items.len()))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;
pub mod render;
pub mod resolver;
pub mod session;
pub mod state;
pub mod transport;

#[cfg(test)]
mod testing;

pub use address::{Address, ApiRoot, Entity};
pub use batch::BatchedFetcher;
pub use cache::FetchCache;
pub use config::Config;
pub use error::{Error, FetchError};
pub use filter::TitleFilter;
pub use models::{Item, ItemBody, ItemId, Updates, User};
pub use resolver::{Expansion, Reconcile, TreeResolver};
pub use session::{Session, SessionParams, SessionSummary};
pub use state::{MaterializedState, Thread};
pub use transport::{HttpTransport, Transport};
