use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde_json::json;
use tracing::{info, warn};

use hn_blog::logging::init_logging;
use hn_blog::render::{render_delta, render_page, DepthTracker};
use hn_blog::{Config, Item, Session, SessionParams, TitleFilter};

#[derive(Parser)]
#[command(
    name = "hn-blog",
    version,
    about = "Show a Hacker News user's stories with their full comment trees"
)]
struct Cli {
    /// User whose submissions are loaded (default: HN_BLOG_USER or simonpure).
    #[arg(long, short)]
    user: Option<String>,

    /// Only keep stories whose title starts with this text (case-sensitive).
    #[arg(long, short)]
    filter: Option<String>,

    /// Query string carrying `user` and `filter`, e.g. "?user=pg&filter=Ask".
    #[arg(long, value_name = "QUERY", conflicts_with_all = ["user", "filter"])]
    query: Option<String>,

    /// Addresses fetched concurrently per group.
    #[arg(long, value_name = "N")]
    group_size: Option<usize>,

    /// API root, e.g. a local mirror.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Per-request timeout in seconds (none by default).
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Stop after loading stories.
    #[arg(long)]
    no_comments: bool,

    /// Print every newly resolved item as it arrives.
    #[arg(long)]
    stream: bool,

    /// Print the materialized state as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::from_env();
        if let Some(size) = self.group_size {
            config.group_size = size;
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(secs) = self.timeout {
            config.request_timeout = Some(Duration::from_secs(secs));
        }
        config
    }

    fn params(&self, config: &Config) -> SessionParams {
        if let Some(query) = &self.query {
            return SessionParams::from_query(query, config);
        }

        let mut params = SessionParams::from_config(config);
        if let Some(user) = &self.user {
            params.user = user.clone();
        }
        if let Some(filter) = &self.filter {
            params.filter = TitleFilter::new(filter);
        }
        params
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = cli.config();
    let params = cli.params(&config);
    let mut session = Session::new(config).context("Failed to create session")?;

    // Ctrl-C stops comment expansion at the next depth level
    let token = session.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, finishing the current level");
            token.cancel();
        }
    });

    let stream = cli.stream;
    let mut deltas = 0usize;
    let mut depths = DepthTracker::new();
    let mut sink = |items: &[Item]| {
        deltas += 1;
        info!(count = items.len(), "new items");
        if stream {
            for item in items {
                println!("{}", render_delta(item, depths.observe(item)));
            }
        }
    };

    let user = session
        .load_user(&params.user)
        .await
        .with_context(|| format!("Failed to load user {}", params.user))?;
    let stories = session
        .load_stories(&user.submitted, &params.filter, &mut sink)
        .await
        .context("Failed to load stories")?;

    let expansion = if cli.no_comments {
        None
    } else {
        Some(
            session
                .expand_stories(&mut sink)
                .await
                .context("Failed to load comments")?,
        )
    };

    info!(
        stories,
        updates = deltas,
        items = session.state().len(),
        cancelled = expansion.is_some_and(|e| e.cancelled),
        "done"
    );

    if cli.json {
        let snapshot = json!({
            "user": session.user(),
            "state": session.state(),
            "expansion": expansion.map(|e| json!({
                "levels": e.levels,
                "resolved": e.resolved,
                "missing": e.missing,
                "cancelled": e.cancelled,
            })),
        });
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", render_page(session.state(), session.user(), Utc::now()));
    }

    session.dispose();
    Ok(())
}
