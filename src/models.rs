use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ItemId = u64;

const DISCUSSION_URL: &str = "https://news.ycombinator.com/item?id=";

/// A resolved story, comment, job or poll. The payload is discriminated by the
/// API's `type` field; records without a recognised `type` keep every field as
/// an optional in [`Untyped`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(from = "RawItem", into = "RawItem")]
pub struct Item {
    pub id: ItemId,
    pub by: Option<String>,
    pub time: Option<i64>,
    pub deleted: bool,
    pub dead: bool,
    pub body: ItemBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemBody {
    Story(Story),
    Comment(Comment),
    Job(Job),
    Poll(Poll),
    PollOpt(PollOpt),
    Untyped(Untyped),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Story {
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    pub score: Option<i64>,
    pub descendants: Option<u64>,
    pub kids: Vec<ItemId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comment {
    pub parent: Option<ItemId>,
    pub text: Option<String>,
    pub kids: Vec<ItemId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Job {
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    pub score: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Poll {
    pub title: Option<String>,
    pub text: Option<String>,
    pub score: Option<i64>,
    pub descendants: Option<u64>,
    pub kids: Vec<ItemId>,
    pub parts: Vec<ItemId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollOpt {
    pub poll: Option<ItemId>,
    pub text: Option<String>,
    pub score: Option<i64>,
}

/// Missing or unrecognised `type`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Untyped {
    pub kind: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    pub parent: Option<ItemId>,
    pub score: Option<i64>,
    pub descendants: Option<u64>,
    pub kids: Vec<ItemId>,
}

impl Item {
    pub fn kind(&self) -> &str {
        match &self.body {
            ItemBody::Story(_) => "story",
            ItemBody::Comment(_) => "comment",
            ItemBody::Job(_) => "job",
            ItemBody::Poll(_) => "poll",
            ItemBody::PollOpt(_) => "pollopt",
            ItemBody::Untyped(untyped) => untyped.kind.as_deref().unwrap_or(""),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match &self.body {
            ItemBody::Story(story) => story.title.as_deref(),
            ItemBody::Job(job) => job.title.as_deref(),
            ItemBody::Poll(poll) => poll.title.as_deref(),
            ItemBody::Untyped(untyped) => untyped.title.as_deref(),
            ItemBody::Comment(_) | ItemBody::PollOpt(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.body {
            ItemBody::Story(story) => story.text.as_deref(),
            ItemBody::Comment(comment) => comment.text.as_deref(),
            ItemBody::Job(job) => job.text.as_deref(),
            ItemBody::Poll(poll) => poll.text.as_deref(),
            ItemBody::PollOpt(opt) => opt.text.as_deref(),
            ItemBody::Untyped(untyped) => untyped.text.as_deref(),
        }
    }

    pub fn url(&self) -> Option<&str> {
        match &self.body {
            ItemBody::Story(story) => story.url.as_deref(),
            ItemBody::Job(job) => job.url.as_deref(),
            ItemBody::Untyped(untyped) => untyped.url.as_deref(),
            _ => None,
        }
    }

    pub fn score(&self) -> Option<i64> {
        match &self.body {
            ItemBody::Story(story) => story.score,
            ItemBody::Job(job) => job.score,
            ItemBody::Poll(poll) => poll.score,
            ItemBody::PollOpt(opt) => opt.score,
            ItemBody::Untyped(untyped) => untyped.score,
            ItemBody::Comment(_) => None,
        }
    }

    pub fn descendants(&self) -> Option<u64> {
        match &self.body {
            ItemBody::Story(story) => story.descendants,
            ItemBody::Poll(poll) => poll.descendants,
            ItemBody::Untyped(untyped) => untyped.descendants,
            _ => None,
        }
    }

    /// Parent of a comment (or the poll of a poll option).
    pub fn parent(&self) -> Option<ItemId> {
        match &self.body {
            ItemBody::Comment(comment) => comment.parent,
            ItemBody::PollOpt(opt) => opt.poll,
            ItemBody::Untyped(untyped) => untyped.parent,
            _ => None,
        }
    }

    /// Child references in display order. Absent and empty lists are the same.
    pub fn kids(&self) -> &[ItemId] {
        match &self.body {
            ItemBody::Story(story) => &story.kids,
            ItemBody::Comment(comment) => &comment.kids,
            ItemBody::Poll(poll) => &poll.kids,
            ItemBody::Untyped(untyped) => &untyped.kids,
            ItemBody::Job(_) | ItemBody::PollOpt(_) => &[],
        }
    }

    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        self.time.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    pub fn discussion_url(&self) -> String {
        format!("{}{}", DISCUSSION_URL, self.id)
    }

    /// Outbound link for a story, or its discussion page when it has none.
    pub fn link(&self) -> String {
        match self.url() {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => self.discussion_url(),
        }
    }
}

// Wire shape of an item: every field optional, `type` as a plain string.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct RawItem {
    id: ItemId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time: Option<i64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    deleted: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    dead: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    poll: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    descendants: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kids: Option<Vec<ItemId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parts: Option<Vec<ItemId>>,
}

impl From<RawItem> for Item {
    fn from(raw: RawItem) -> Self {
        let kids = raw.kids.unwrap_or_default();
        let body = match raw.kind.as_deref() {
            Some("story") => ItemBody::Story(Story {
                title: raw.title,
                url: raw.url,
                text: raw.text,
                score: raw.score,
                descendants: raw.descendants,
                kids,
            }),
            Some("comment") => ItemBody::Comment(Comment {
                parent: raw.parent,
                text: raw.text,
                kids,
            }),
            Some("job") => ItemBody::Job(Job {
                title: raw.title,
                url: raw.url,
                text: raw.text,
                score: raw.score,
            }),
            Some("poll") => ItemBody::Poll(Poll {
                title: raw.title,
                text: raw.text,
                score: raw.score,
                descendants: raw.descendants,
                kids,
                parts: raw.parts.unwrap_or_default(),
            }),
            Some("pollopt") => ItemBody::PollOpt(PollOpt {
                poll: raw.poll.or(raw.parent),
                text: raw.text,
                score: raw.score,
            }),
            _ => ItemBody::Untyped(Untyped {
                kind: raw.kind,
                title: raw.title,
                url: raw.url,
                text: raw.text,
                parent: raw.parent,
                score: raw.score,
                descendants: raw.descendants,
                kids,
            }),
        };

        Item {
            id: raw.id,
            by: raw.by,
            time: raw.time,
            deleted: raw.deleted,
            dead: raw.dead,
            body,
        }
    }
}

impl From<Item> for RawItem {
    fn from(item: Item) -> Self {
        fn list(ids: Vec<ItemId>) -> Option<Vec<ItemId>> {
            (!ids.is_empty()).then_some(ids)
        }

        let mut raw = RawItem {
            id: item.id,
            by: item.by,
            time: item.time,
            deleted: item.deleted,
            dead: item.dead,
            ..RawItem::default()
        };

        match item.body {
            ItemBody::Story(story) => {
                raw.kind = Some("story".to_string());
                raw.title = story.title;
                raw.url = story.url;
                raw.text = story.text;
                raw.score = story.score;
                raw.descendants = story.descendants;
                raw.kids = list(story.kids);
            }
            ItemBody::Comment(comment) => {
                raw.kind = Some("comment".to_string());
                raw.parent = comment.parent;
                raw.text = comment.text;
                raw.kids = list(comment.kids);
            }
            ItemBody::Job(job) => {
                raw.kind = Some("job".to_string());
                raw.title = job.title;
                raw.url = job.url;
                raw.text = job.text;
                raw.score = job.score;
            }
            ItemBody::Poll(poll) => {
                raw.kind = Some("poll".to_string());
                raw.title = poll.title;
                raw.text = poll.text;
                raw.score = poll.score;
                raw.descendants = poll.descendants;
                raw.kids = list(poll.kids);
                raw.parts = list(poll.parts);
            }
            ItemBody::PollOpt(opt) => {
                raw.kind = Some("pollopt".to_string());
                raw.poll = opt.poll;
                raw.text = opt.text;
                raw.score = opt.score;
            }
            ItemBody::Untyped(untyped) => {
                raw.kind = untyped.kind;
                raw.title = untyped.title;
                raw.url = untyped.url;
                raw.text = untyped.text;
                raw.parent = untyped.parent;
                raw.score = untyped.score;
                raw.descendants = untyped.descendants;
                raw.kids = list(untyped.kids);
            }
        }

        raw
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub karma: i64,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub submitted: Vec<ItemId>,
}

/// Payload of the `updates` endpoint: recently changed items and profiles.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Updates {
    #[serde(default)]
    pub items: Vec<ItemId>,
    #[serde(default)]
    pub profiles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: serde_json::Value) -> Item {
        serde_json::from_value(value).expect("item should decode")
    }

    #[test]
    fn story_fields_land_in_story_variant() {
        let story = item(json!({
            "id": 8863, "type": "story", "by": "dhouston", "time": 1175714200,
            "title": "My YC app: Dropbox", "url": "http://www.getdropbox.com/u/2/screencast.html",
            "score": 111, "descendants": 71, "kids": [9224, 8917]
        }));

        assert!(matches!(story.body, ItemBody::Story(_)));
        assert_eq!(story.kind(), "story");
        assert_eq!(story.title(), Some("My YC app: Dropbox"));
        assert_eq!(story.kids(), &[9224, 8917]);
        assert_eq!(story.score(), Some(111));
        assert_eq!(story.descendants(), Some(71));
        assert_eq!(story.link(), "http://www.getdropbox.com/u/2/screencast.html");
        assert_eq!(
            story.posted_at().map(|t| t.timestamp()),
            Some(1175714200)
        );
    }

    #[test]
    fn comment_has_parent_and_no_title() {
        let comment = item(json!({
            "id": 2921983, "type": "comment", "by": "norvig", "parent": 2921506,
            "text": "Aw shucks", "time": 1314211127, "kids": [2922097]
        }));

        assert_eq!(comment.title(), None);
        assert_eq!(comment.parent(), Some(2921506));
        assert_eq!(comment.text(), Some("Aw shucks"));
        assert_eq!(comment.kids(), &[2922097]);
    }

    #[test]
    fn missing_type_keeps_fields_untyped() {
        let bare = item(json!({"id": 10, "title": "Hello"}));
        assert_eq!(bare.kind(), "");
        assert_eq!(bare.title(), Some("Hello"));
        assert!(bare.kids().is_empty());
        assert_eq!(bare.link(), "https://news.ycombinator.com/item?id=10");

        let odd = item(json!({"id": 11, "type": "mystery", "kids": [1]}));
        assert_eq!(odd.kind(), "mystery");
        assert_eq!(odd.kids(), &[1]);
    }

    #[test]
    fn absent_and_empty_kids_are_equivalent() {
        let absent = item(json!({"id": 1, "type": "comment"}));
        let empty = item(json!({"id": 1, "type": "comment", "kids": []}));
        assert_eq!(absent, empty);
        assert!(absent.kids().is_empty());
    }

    #[test]
    fn deleted_stub_decodes() {
        let stub = item(json!({"id": 5, "type": "comment", "deleted": true, "parent": 4}));
        assert!(stub.deleted);
        assert_eq!(stub.text(), None);
    }

    #[test]
    fn serializes_back_to_wire_shape() {
        let poll = item(json!({
            "id": 126809, "type": "poll", "title": "Poll", "parts": [126810, 126811],
            "kids": [126822]
        }));
        let value = serde_json::to_value(&poll).expect("serialize");
        assert_eq!(value["type"], "poll");
        assert_eq!(value["parts"], json!([126810, 126811]));
        assert!(value.get("deleted").is_none());
        assert_eq!(item(value), poll);
    }

    #[test]
    fn user_defaults_missing_fields() {
        let user: User = serde_json::from_value(json!({"id": "jl", "created": 1173923446}))
            .expect("user should decode");
        assert_eq!(user.karma, 0);
        assert!(user.submitted.is_empty());
        assert_eq!(user.about, None);
    }
}
