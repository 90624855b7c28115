//! # ls-ui
//!
//! Plain-text rendering of the feed screen for the terminal client.

pub mod time;

use askama::Template;
use chrono::{DateTime, Utc};
use ls_core::{FeedEntry, Profile};

pub use time::time_ago;

#[derive(Template)]
#[template(path = "post_card.txt")]
pub struct PostCardTemplate<'a> {
    pub initials: String,
    pub author: &'a str,
    pub time_ago: String,
    pub content: &'a str,
    pub image_url: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "navbar.txt")]
pub struct NavbarTemplate<'a> {
    pub initials: String,
    pub name: &'a str,
}

#[derive(Template)]
#[template(path = "feed.txt")]
pub struct FeedTemplate {
    pub navbar: String,
    pub cards: Vec<String>,
}

/// Avatar fallback: first letter of up to two words, uppercased.
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

pub fn render_post_card(entry: &FeedEntry, now: DateTime<Utc>) -> askama::Result<String> {
    PostCardTemplate {
        initials: initials(&entry.author.full_name),
        author: &entry.author.full_name,
        time_ago: time_ago(entry.post.created_at, now),
        content: &entry.post.content,
        image_url: entry.post.image_url.as_deref(),
    }
    .render()
}

pub fn render_navbar(profile: &Profile) -> askama::Result<String> {
    NavbarTemplate {
        initials: initials(&profile.full_name),
        name: &profile.full_name,
    }
    .render()
}

/// Renders the whole feed screen for the signed-in `profile`.
pub fn render_feed(
    profile: &Profile,
    entries: &[FeedEntry],
    now: DateTime<Utc>,
) -> askama::Result<String> {
    let cards = entries
        .iter()
        .map(|entry| render_post_card(entry, now))
        .collect::<askama::Result<Vec<_>>>()?;

    FeedTemplate {
        navbar: render_navbar(profile)?,
        cards,
    }
    .render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ls_core::{Identity, Post, PLACEHOLDER_NAME};
    use uuid::Uuid;

    fn entry(name: &str, content: &str, image_url: Option<&str>, age_secs: i64) -> FeedEntry {
        FeedEntry {
            post: Post {
                id: Uuid::now_v7(),
                user_id: Identity::new("u1"),
                content: content.to_string(),
                image_url: image_url.map(str::to_string),
                created_at: Utc::now() - Duration::seconds(age_secs),
            },
            author: Profile {
                id: Identity::new("u1"),
                full_name: name.to_string(),
                avatar_url: None,
            },
        }
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("ada lovelace"), "AL");
        assert_eq!(initials("Grace Brewster Murray Hopper"), "GB");
        assert_eq!(initials("Cher"), "C");
        assert_eq!(initials("  "), "?");
    }

    #[test]
    fn test_post_card_shows_text_and_image() {
        let card = render_post_card(
            &entry("Ada Lovelace", "Hello", Some("https://cdn.test/a.png"), 120),
            Utc::now(),
        )
        .unwrap();
        assert!(card.contains("[AL] Ada Lovelace · 2 minutes ago"));
        assert!(card.contains("Hello"));
        assert!(card.contains("[image] https://cdn.test/a.png"));
    }

    #[test]
    fn test_image_only_card_has_no_text_line() {
        let card = render_post_card(
            &entry(PLACEHOLDER_NAME, "", Some("https://cdn.test/b.png"), 0),
            Utc::now(),
        )
        .unwrap();
        assert!(card.contains("[UU] Unknown User"));
        assert_eq!(card.lines().count(), 2);
    }

    #[test]
    fn test_empty_feed_message() {
        let profile = Profile {
            id: Identity::new("u1"),
            full_name: "Ada".to_string(),
            avatar_url: None,
        };
        let screen = render_feed(&profile, &[], Utc::now()).unwrap();
        assert!(screen.contains("[A] Ada"));
        assert!(screen.contains("No posts yet. Be the first to share something!"));
    }

    #[test]
    fn test_feed_lists_cards_in_order() {
        let profile = Profile {
            id: Identity::new("u1"),
            full_name: "Ada".to_string(),
            avatar_url: None,
        };
        let entries = vec![entry("Ada", "newer", None, 10), entry("Ada", "older", None, 4000)];
        let screen = render_feed(&profile, &entries, Utc::now()).unwrap();
        let newer = screen.find("newer").unwrap();
        let older = screen.find("older").unwrap();
        assert!(newer < older);
        assert!(!screen.contains("No posts yet"));
    }
}
