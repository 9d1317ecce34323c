//! Chat messages for the signup check and for event link expansion.

use crate::error::ModelError;
use crate::templates::{CategoriesTemplate, CategoryLine, EmptyStateTemplate, HeaderTemplate};
use crate::types::chat::{Embed, EmbedFooter, Emoji, OutgoingMessage};
use crate::types::rider::RaceSignup;
use crate::zwift::event::{Access, CourseLength, Rule};
use crate::zwift::reference::ReferenceTable;
use crate::zwift::tags::{self, TagFeature};
use crate::zwift::{Event, results_url};

use askama::Template;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// Chat client timestamp markup, rendered in each reader's own zone.
#[derive(Debug, Clone, Copy)]
pub struct TimeTag(pub OffsetDateTime);

impl TimeTag {
    fn format(&self, style: char) -> String {
        format!("<t:{}:{style}>", self.0.unix_timestamp())
    }

    pub fn short_time(&self) -> String {
        self.format('t')
    }

    pub fn long_date_short_time_dow(&self) -> String {
        self.format('F')
    }
}

const DURATION_PRECISION: usize = 2;

/// `5430` -> `1 hour, 30 minutes`; only the two largest non-zero units are kept.
pub fn humanize_seconds(total: u64) -> String {
    let units = [("day", 86_400), ("hour", 3_600), ("minute", 60), ("second", 1)];
    let mut remaining = total;
    let mut parts = Vec::new();
    for (name, size) in units {
        let amount = remaining / size;
        remaining %= size;
        if amount > 0 {
            let plural = if amount == 1 { "" } else { "s" };
            parts.push(format!("{amount} {name}{plural}"));
        }
    }
    if parts.is_empty() {
        return "0 seconds".to_string();
    }
    parts.truncate(DURATION_PRECISION);
    parts.join(", ")
}

fn title_case(value: &str) -> String {
    value
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn percent(value: f64) -> String {
    format!("{:.0}%", value * 100.0)
}

/// Category label -> `zcat<label>` guild emoji.
fn category_badges(emojis: &[Emoji]) -> HashMap<String, String> {
    ["A", "B", "C", "D", "E"]
        .into_iter()
        .filter_map(|label| {
            let name = format!("zcat{}", label.to_lowercase());
            emojis
                .iter()
                .find(|emoji| emoji.name == name)
                .map(|emoji| (label.to_string(), emoji.to_string()))
        })
        .collect()
}

pub fn header_message(community: &str, lookahead_hours: i64) -> Result<OutgoingMessage, RenderError> {
    let text = HeaderTemplate {
        community,
        lookahead_hours,
    }
    .render()?;
    Ok(OutgoingMessage::text(text.trim()))
}

pub fn empty_message() -> Result<OutgoingMessage, RenderError> {
    Ok(OutgoingMessage::text(EmptyStateTemplate.render()?.trim()))
}

/// One embed describing an event, its categories and the given roster.
pub fn event_message(
    event: &Event,
    roster: &[RaceSignup],
    emojis: &[Emoji],
    reference: &ReferenceTable,
) -> Result<OutgoingMessage, RenderError> {
    let badges = category_badges(emojis);
    let id = event.id()?;
    let subgroups = event.subgroups()?;

    let mut worlds = HashSet::new();
    let mut routes = HashSet::new();
    for subgroup in &subgroups {
        worlds.insert(subgroup.map(reference)?);
        routes.insert(subgroup.route_id()?);
    }
    let same_world = worlds.len() == 1;
    let same_route = routes.len() == 1;

    let kind = match event.event_type() {
        Ok(kind) => kind.label().to_string(),
        Err(ModelError::UnknownVariant { value, .. }) => title_case(&value),
        Err(err) => return Err(err.into()),
    };

    let mut embed = Embed {
        title: event.name()?.replace('|', r"\|"),
        url: Some(event.url()?),
        description: Some(results_url(id)),
        ..Embed::default()
    };
    embed.field("Type", kind, true);

    let route = event.route(reference)?;
    if same_route {
        embed.field("Route", route.name, true);
    }
    if same_world {
        embed.field("World", route.world, true);
    }

    embed.field(
        "Start",
        TimeTag(event.event_start()?).long_date_short_time_dow(),
        true,
    );

    match event.course_length()? {
        CourseLength::Distance { meters } => {
            embed.field("Custom Distance", format!("{:.1} km", meters / 1000.0), true);
        }
        CourseLength::Duration { seconds } => {
            embed.field("Duration", humanize_seconds(seconds), true);
        }
        CourseLength::Laps(laps) => {
            let meters = route.leadin_distance_in_meters + laps as f64 * route.distance_in_meters;
            embed.field("Laps", format!("{laps} ({:.1} km)", meters / 1000.0), true);
        }
        CourseLength::Unspecified => {}
    }

    let event_difficulty = event.trainer_difficulty_min()?;
    let mut lines = Vec::with_capacity(subgroups.len());
    for subgroup in &subgroups {
        let label = subgroup.subgroup_label()?;
        let mut rules = String::new();
        if subgroup.rules()?.contains(&Rule::NoDrafting) {
            rules.push_str("(no draft)");
        }
        for feature in tags::decode_all(subgroup.tags()?, reference) {
            match feature {
                TagFeature::TrainerDifficultyMin(value) if event_difficulty.is_none() => {
                    rules.push_str(&format!("(TD:{})", percent(value)));
                }
                TagFeature::SteeringDisabled => rules.push_str("(no steering)"),
                _ => {}
            }
        }
        let access = match subgroup.access()? {
            Access::Label(label) => label,
            Access::Pace { from, to } => format!("{from:.1}-{to:.1} w/kg"),
        };
        lines.push(CategoryLine {
            badge: badges.get(label).cloned().unwrap_or_else(|| label.to_string()),
            start: TimeTag(subgroup.event_subgroup_start()?).short_time(),
            access,
            route: if same_route {
                String::new()
            } else {
                format!(", {}", subgroup.route(reference)?.name)
            },
            world: if same_world {
                String::new()
            } else {
                format!(" ({})", subgroup.map(reference)?)
            },
            rules,
        });
    }
    let cats = CategoriesTemplate { lines: &lines }.render()?;
    embed.field("Cats", cats.trim(), false);

    if !roster.is_empty() {
        let signups: Vec<String> = roster
            .iter()
            .map(|rider| {
                let badge = badges
                    .get(&rider.category)
                    .cloned()
                    .unwrap_or_else(|| rider.category.clone());
                format!("{badge} {}", rider.name).trim().to_string()
            })
            .collect();
        embed.field("Signups", signups.join("\n"), false);
    }

    if let Some(powerups) = event.powerups()?.filter(|powerups| !powerups.is_empty()) {
        let lines: Vec<String> = powerups
            .iter()
            .map(|(name, pct)| format!("{name} - {pct}%"))
            .collect();
        embed.field("Powerups", lines.join("\n"), false);
    }

    let mut footer = Vec::new();
    if event.category_enforcement()? {
        footer.push("category enforcement".to_string());
    }
    if let Some(value) = event_difficulty {
        footer.push(format!("TD:{}", percent(value)));
    }
    footer.extend(
        event
            .rules()?
            .into_iter()
            .filter_map(Rule::label)
            .map(str::to_string),
    );

    if let Some(bike) = event.bike_hash()? {
        embed.field("Fixed Bike", reference.item_name(bike), true);
    }
    if let Some(jersey) = event.jersey_hash()? {
        embed.field("Fixed jersey", reference.item_name(jersey), true);
    }

    footer.extend(tags::labels(event.tags()?, reference));
    if !footer.is_empty() {
        embed.footer = Some(EmbedFooter {
            text: footer.join(", "),
        });
    }

    Ok(OutgoingMessage::embed(embed))
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::zwift::event::tests::sample_event;
    use serde_json::json;

    fn reference() -> ReferenceTable {
        ReferenceTable::bundled().expect("reference")
    }

    fn emojis() -> Vec<Emoji> {
        vec![
            Emoji {
                id: 11,
                name: "zcata".to_string(),
                animated: false,
            },
            Emoji {
                id: 12,
                name: "party".to_string(),
                animated: false,
            },
        ]
    }

    fn roster() -> Vec<RaceSignup> {
        vec![
            RaceSignup {
                id: 399078,
                name: "Mick".to_string(),
                team_id: Some(13264),
                category: "A".to_string(),
            },
            RaceSignup {
                id: 1001,
                name: "Anna".to_string(),
                team_id: None,
                category: "B".to_string(),
            },
        ]
    }

    #[test]
    fn humanize_seconds__should_keep_two_largest_units() {
        // Then
        assert_eq!(humanize_seconds(3600), "1 hour");
        assert_eq!(humanize_seconds(5430), "1 hour, 30 minutes");
        assert_eq!(humanize_seconds(90061), "1 day, 1 hour");
        assert_eq!(humanize_seconds(3630), "1 hour, 30 seconds");
        assert_eq!(humanize_seconds(45), "45 seconds");
        assert_eq!(humanize_seconds(0), "0 seconds");
    }

    #[test]
    fn time_tag__should_render_chat_markup() {
        // Given
        let tag = TimeTag(time::macros::datetime!(2025-01-14 18:00 UTC));

        // Then
        assert_eq!(tag.short_time(), "<t:1736877600:t>");
        assert_eq!(tag.long_date_short_time_dow(), "<t:1736877600:F>");
    }

    #[test]
    fn header_message__should_mention_window_and_commands() {
        // When
        let message = header_message("Backpedal", 4).expect("header");

        // Then
        let content = message.content.expect("content");
        assert!(content.starts_with("# Backpedal Signups in the upcoming 4 hours:"));
        assert!(content.contains("!add_signups yourzwiftid"));
        assert!(content.ends_with("!del_signups yourzwiftid"));
    }

    #[test]
    fn empty_message__should_be_distinct_text() {
        // Then
        assert_eq!(
            empty_message().expect("empty").content.as_deref(),
            Some("Nobody has signed up to an event! :sweat_smile:")
        );
    }

    #[test]
    fn event_message__should_render_event_embed() {
        // Given
        let event = Event::from_value(sample_event()).expect("event");

        // When
        let message = event_message(&event, &roster(), &emojis(), &reference()).expect("render");

        // Then
        let embed = &message.embeds[0];
        assert_eq!(embed.title, r"Backpedal \| Tuesday Race");
        assert_eq!(
            embed.url.as_deref(),
            Some("https://www.zwift.com/events/view/4123456")
        );
        assert_eq!(
            embed.description.as_deref(),
            Some("https://zwiftpower.com/events.php?zid=4123456")
        );
        assert_eq!(embed.field_value("Type"), Some("Race"));
        assert_eq!(embed.field_value("Route"), Some("Volcano Flat"));
        assert_eq!(embed.field_value("World"), Some("WATOPIA"));
        assert_eq!(embed.field_value("Start"), Some("<t:1736877600:F>"));
        assert_eq!(embed.field_value("Laps"), Some("3 (37.2 km)"));
        assert_eq!(
            embed.field_value("Cats"),
            Some(
                "<:zcata:11> <t:1736877600:t> 4.0-5.0 w/kg (no draft)\n\
                 B <t:1736877660:t> 0-300 (no steering)"
            )
        );
        assert_eq!(embed.field_value("Signups"), Some("<:zcata:11> Mick\nB Anna"));
        assert_eq!(embed.field_value("Fixed jersey"), Some("Backpedal Team Kit"));
        assert_eq!(embed.field_value("Fixed Bike"), None);
        assert_eq!(
            embed.footer.as_ref().map(|footer| footer.text.as_str()),
            Some("category enforcement, TD:50%, no powerups, late join, doubledraft")
        );
    }

    #[test]
    fn event_message__should_list_routes_per_category_when_they_differ() {
        // Given
        let mut value = sample_event();
        value["eventSubgroups"][1]["routeId"] = json!(2627606248u64);
        value["tags"] = json!(["powerup_percent=0,50,5,50"]);
        value["laps"] = json!(0);
        value["durationInSeconds"] = json!(5400);
        let event = Event::from_value(value).expect("event");

        // When
        let message = event_message(&event, &[], &[], &reference()).expect("render");

        // Then
        let embed = &message.embeds[0];
        assert_eq!(embed.field_value("Route"), None);
        assert_eq!(embed.field_value("World"), None);
        assert_eq!(embed.field_value("Duration"), Some("1 hour, 30 minutes"));
        assert_eq!(embed.field_value("Signups"), None);
        assert_eq!(embed.field_value("Powerups"), Some("Feather - 50%\nAero - 50%"));
        let cats = embed.field_value("Cats").expect("cats");
        assert!(cats.contains("A <t:1736877600:t> 4.0-5.0 w/kg, Volcano Flat (WATOPIA) (no draft)"));
        assert!(cats.contains("B <t:1736877660:t> 0-300, Greater London Flat (LONDON) (no steering)"));
    }

    #[test]
    fn event_message__should_degrade_unknown_routes_and_types() {
        // Given
        let mut value = sample_event();
        value["routeId"] = json!(5);
        value["eventSubgroups"][0]["routeId"] = json!(5);
        value["eventSubgroups"][1]["routeId"] = json!(5);
        value["eventType"] = json!("TEAM_TIME_TRIAL");
        value["laps"] = json!(null);
        let event = Event::from_value(value).expect("event");

        // When
        let message = event_message(&event, &[], &[], &reference()).expect("render");

        // Then
        let embed = &message.embeds[0];
        assert_eq!(embed.field_value("Type"), Some("Team Time Trial"));
        assert_eq!(embed.field_value("Route"), Some("Unknown"));
        assert_eq!(embed.field_value("World"), Some("Unknown"));
    }

    #[test]
    fn event_message__should_omit_route_and_world_without_subgroups() {
        // Given
        let mut value = sample_event();
        value["eventSubgroups"] = json!([]);
        let event = Event::from_value(value).expect("event");

        // When
        let message = event_message(&event, &[], &[], &reference()).expect("render");

        // Then
        let embed = &message.embeds[0];
        assert_eq!(embed.field_value("Route"), None);
        assert_eq!(embed.field_value("World"), None);
        assert_eq!(embed.field_value("Type"), Some("Race"));
    }
}
