use std::collections::HashMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{Item, ItemId, User};
use crate::state::{MaterializedState, Thread};

lazy_static! {
    static ref ITEM_LINK: Regex = Regex::new(r#"<a\s+href="item\?id=\d+"[^>]*>([^<]+)</a>"#)
        .expect("item link pattern");
    static ref PARAGRAPH: Regex = Regex::new(r"(?i)<p\s*/?>").expect("paragraph pattern");
    static ref TAG: Regex = Regex::new(r"<[^>]+>").expect("tag pattern");
}

const INDENT: &str = "  ";

// Reduce comment HTML to plain text
pub fn clean_html(html: &str) -> String {
    // Keep the text of <a href="item?id=...">...</a> links
    let text = ITEM_LINK.replace_all(html, "$1");
    let text = PARAGRAPH.replace_all(&text, "\n\n");
    let text = TAG.replace_all(&text, "");
    html_escape::decode_html_entities(&text).trim().to_string()
}

pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);

    let (amount, unit) = if elapsed.num_days() >= 365 {
        (elapsed.num_days() / 365, "year")
    } else if elapsed.num_days() >= 30 {
        (elapsed.num_days() / 30, "month")
    } else if elapsed.num_days() >= 1 {
        (elapsed.num_days(), "day")
    } else if elapsed.num_hours() >= 1 {
        (elapsed.num_hours(), "hour")
    } else if elapsed.num_minutes() >= 1 {
        (elapsed.num_minutes(), "minute")
    } else {
        return "just now".to_string();
    };

    let plural = if amount == 1 { "" } else { "s" };
    format!("{} {}{} ago", amount, unit, plural)
}

fn posted(item: &Item, now: DateTime<Utc>) -> String {
    item.posted_at()
        .map(|then| time_ago(then, now))
        .unwrap_or_default()
}

pub fn render_user(user: &User) -> String {
    let mut out = format!("{} ({} karma)\n", user.id, user.karma);
    if let Some(about) = user.about.as_deref().filter(|about| !about.is_empty()) {
        out.push_str(&clean_html(about));
        out.push('\n');
    }
    out
}

/// One line per newly resolved item, for streaming output.
pub fn render_delta(item: &Item, depth: usize) -> String {
    let label = match item.title() {
        Some(title) => title.to_string(),
        None => {
            let text = clean_html(item.text().unwrap_or_default());
            text.lines().next().unwrap_or_default().chars().take(72).collect()
        }
    };
    format!(
        "{}+ {} #{} {}",
        INDENT.repeat(depth),
        item.kind(),
        item.id,
        label
    )
}

/// Depth of streamed items, learned from the `parent` of each one seen so far.
/// Items arrive parents first, so a reply's parent is normally already known.
#[derive(Debug, Default)]
pub struct DepthTracker {
    depths: HashMap<ItemId, usize>,
}

impl DepthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `item` and return its depth. A parent never seen counts as a
    /// story, so its reply sits one level in.
    pub fn observe(&mut self, item: &Item) -> usize {
        let depth = match item.parent() {
            Some(parent) => self.depths.get(&parent).copied().unwrap_or(0) + 1,
            None => 0,
        };
        *self.depths.entry(item.id).or_insert(depth)
    }
}

pub fn render_story(state: &MaterializedState, story: &Item, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "[{}] {}",
        story.score().unwrap_or_default(),
        story.title().unwrap_or_default()
    );
    let _ = writeln!(out, "    {}", story.link());
    let _ = writeln!(
        out,
        "    by {} {} | {} comments | {}",
        story.by.as_deref().unwrap_or("?"),
        posted(story, now),
        story.descendants().unwrap_or_default(),
        story.discussion_url()
    );

    for thread in state.thread(story.kids()) {
        render_thread(&mut out, &thread, 1, now);
    }
    out
}

fn render_thread(out: &mut String, thread: &Thread<'_>, depth: usize, now: DateTime<Utc>) {
    let item = thread.item;
    let pad = INDENT.repeat(depth);

    if item.deleted || item.dead {
        let _ = writeln!(out, "{}[deleted]", pad);
    } else {
        let _ = writeln!(
            out,
            "{}{} {}",
            pad,
            item.by.as_deref().unwrap_or("?"),
            posted(item, now)
        );
        for line in clean_html(item.text().unwrap_or_default()).lines() {
            let _ = writeln!(out, "{}| {}", pad, line);
        }
    }

    for reply in &thread.replies {
        render_thread(out, reply, depth + 1, now);
    }
}

pub fn render_page(state: &MaterializedState, user: Option<&User>, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    if let Some(user) = user {
        out.push_str(&render_user(user));
        out.push('\n');
    }
    for story in state.stories() {
        out.push_str(&render_story(state, story, now));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn item(value: serde_json::Value) -> Item {
        serde_json::from_value(value).expect("item decodes")
    }

    #[test]
    fn clean_html_strips_tags_and_entities() {
        let html = r#"See <a href="item?id=123">this thread</a><p>It&#x27;s &quot;fine&quot; &amp; <i>good</i>"#;
        assert_eq!(clean_html(html), "See this thread\n\nIt's \"fine\" & good");
    }

    #[test]
    fn time_ago_picks_largest_unit() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(time_ago(now - Duration::seconds(20), now), "just now");
        assert_eq!(time_ago(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(time_ago(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(time_ago(now - Duration::days(2), now), "2 days ago");
        assert_eq!(time_ago(now - Duration::days(800), now), "2 years ago");
    }

    #[test]
    fn story_renders_nested_comments() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut state = MaterializedState::new();
        let story = item(json!({
            "id": 1, "type": "story", "title": "Hello", "by": "pg", "score": 5,
            "descendants": 2, "kids": [2], "time": now.timestamp() - 7200
        }));
        state.accept_story(story.clone());
        state.insert(item(json!({"id": 2, "type": "comment", "by": "a", "text": "top", "kids": [3]})));
        state.insert(item(json!({"id": 3, "type": "comment", "deleted": true})));

        let out = render_story(&state, &story, now);

        assert!(out.starts_with("[5] Hello\n"));
        assert!(out.contains("by pg 2 hours ago | 2 comments"));
        assert!(out.contains("\n  a \n  | top\n"));
        assert!(out.contains("\n    [deleted]\n"));
    }

    #[test]
    fn delta_lines_are_indented_by_depth() {
        let comment = item(json!({"id": 9, "type": "comment", "text": "<p>hi there"}));
        assert_eq!(render_delta(&comment, 2), "    + comment #9 hi there");
    }

    #[test]
    fn depth_tracker_follows_parents() {
        let mut depths = DepthTracker::new();
        let story = item(json!({"id": 1, "type": "story", "title": "Hello", "kids": [2]}));
        let comment = item(json!({"id": 2, "type": "comment", "parent": 1, "kids": [3]}));
        let reply = item(json!({"id": 3, "type": "comment", "parent": 2}));
        let orphan = item(json!({"id": 4, "type": "comment", "parent": 99}));

        assert_eq!(depths.observe(&story), 0);
        assert_eq!(depths.observe(&comment), 1);
        assert_eq!(depths.observe(&reply), 2);
        assert_eq!(depths.observe(&orphan), 1);
        // the first depth recorded for an id sticks
        assert_eq!(depths.observe(&reply), 2);
        assert_eq!(render_delta(&reply, depths.observe(&reply)), "    + comment #3 ");
    }
}
