pub mod event;
pub mod reference;
pub mod tags;

use regex::Regex;
use std::sync::LazyLock;

pub use event::{Event, EventSubgroup, RawRecord, normalize};
pub use reference::ReferenceTable;

static EVENT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https?://(?:www\.)?zwift\.com/\S*events/\S*view/(?P<eid>[0-9]+)(?:\?eventSecret=(?P<secret>[0-9a-z]+))?",
    )
    .expect("event link pattern")
});

/// An event page link found in a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLink {
    pub id: u64,
    pub secret: Option<String>,
}

pub fn event_url(id: u64) -> String {
    format!("https://www.zwift.com/events/view/{id}")
}

pub fn results_url(id: u64) -> String {
    format!("https://zwiftpower.com/events.php?zid={id}")
}

pub fn event_links(text: &str) -> Vec<EventLink> {
    EVENT_LINK
        .captures_iter(text)
        .filter_map(|captures| {
            let id = captures.name("eid")?.as_str().parse().ok()?;
            let secret = captures.name("secret").map(|m| m.as_str().to_string());
            Some(EventLink { id, secret })
        })
        .collect()
}

/// Accepts an event page link or a bare event id.
pub fn parse_event_reference(input: &str) -> Option<EventLink> {
    let input = input.trim();
    if let Ok(id) = input.parse() {
        return Some(EventLink { id, secret: None });
    }
    event_links(input).into_iter().next()
}
