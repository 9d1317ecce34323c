//! Decoding of the free-text `key=value` modifier tags attached to events
//! and subgroups.
//!
//! Decoding is total: unknown or malformed tags decode to nothing.

use super::reference::{ReferenceTable, UNKNOWN};

pub(crate) const POWERUP_PERCENT: &str = "powerup_percent";
pub(crate) const TRAINER_DIFFICULTY_MIN: &str = "trainer_difficulty_min";
const STEERING_DISABLED: &str = "steering_disabled";

// Index 2 has no known name.
const POWERUPS: [Option<&str>; 9] = [
    Some("Feather"),
    Some("Draft"),
    None,
    Some("Large XP"),
    Some("Burrito"),
    Some("Aero"),
    Some("Ghost"),
    Some("Steamroller"),
    Some("Anvil"),
];

#[derive(Debug, Clone, Copy)]
enum Payload {
    /// Tag without a value; the label is shown as is.
    Flag,
    /// Numeric override shown verbatim.
    Raw,
    /// Equipment id resolved through the item table.
    Item,
}

const VOCABULARY: &[(&str, &str, Payload)] = &[
    ("doubledraft", "doubledraft", Payload::Flag),
    ("ttbikesdraft", "tt bikes draft", Payload::Flag),
    ("jerseyunlock", "jerseyunlock", Payload::Flag),
    ("bike_cda_bias", "CDA", Payload::Raw),
    ("front_wheel_grams", "FW grams", Payload::Raw),
    ("front_wheel_cda_bias", "FW CDA", Payload::Raw),
    ("rear_wheel_grams", "RW grams", Payload::Raw),
    ("rear_wheel_cda_bias", "RW CDA", Payload::Raw),
    ("front_wheel_crr", "FW CRR", Payload::Raw),
    ("rear_wheel_crr", "RW CRR", Payload::Raw),
    ("fwheel_override", "FW override", Payload::Item),
    ("rwheeloverride", "RW override", Payload::Item),
    ("completionprize", "Completionprize", Payload::Item),
];

/// A decoded tag.
#[derive(Debug, Clone, PartialEq)]
pub enum TagFeature {
    Label(String),
    Powerups(Vec<(String, u32)>),
    TrainerDifficultyMin(f64),
    SteeringDisabled,
}

pub fn powerup_name(index: u32) -> String {
    match POWERUPS.get(index as usize).copied().flatten() {
        Some(name) => name.to_string(),
        None => format!("{UNKNOWN} ({index})"),
    }
}

/// Payload after the final `=`, or the whole tag when there is none.
pub fn tag_value(tag: &str) -> &str {
    tag.rsplit('=').next().unwrap_or(tag)
}

fn tag_key(tag: &str) -> &str {
    tag.split('=').next().unwrap_or(tag).trim()
}

/// Decodes `powerup_percent=<index>,<pct>,...` into ordered (name, pct) pairs.
pub fn decode_powerups(tag: &str) -> Option<Vec<(String, u32)>> {
    let payload = tag.strip_prefix(POWERUP_PERCENT)?.strip_prefix('=')?;
    let payload = strip_wrapper(payload);
    if payload.is_empty() {
        return None;
    }

    let numbers = payload
        .split(',')
        .map(|part| part.trim().parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?;
    if numbers.len() % 2 != 0 {
        return None;
    }

    Some(
        numbers
            .chunks_exact(2)
            .map(|pair| (powerup_name(pair[0]), pair[1]))
            .collect(),
    )
}

// Tolerates one enclosing character and a stray comma on either side, e.g. `[0,20,5,80,]`.
fn strip_wrapper(payload: &str) -> &str {
    let mut payload = payload.trim();
    if let Some(first) = payload.chars().next()
        && !first.is_ascii_digit()
        && first != ','
    {
        payload = &payload[first.len_utf8()..];
    }
    payload = payload.strip_prefix(',').unwrap_or(payload);
    if let Some(last) = payload.chars().last()
        && !last.is_ascii_digit()
        && last != ','
    {
        payload = &payload[..payload.len() - last.len_utf8()];
    }
    payload.strip_suffix(',').unwrap_or(payload)
}

pub fn decode(tag: &str, reference: &ReferenceTable) -> Option<TagFeature> {
    let key = tag_key(tag);
    match key {
        POWERUP_PERCENT => return decode_powerups(tag).map(TagFeature::Powerups),
        TRAINER_DIFFICULTY_MIN => {
            return tag_value(tag)
                .trim()
                .parse::<f64>()
                .ok()
                .map(TagFeature::TrainerDifficultyMin);
        }
        STEERING_DISABLED => return Some(TagFeature::SteeringDisabled),
        _ => {}
    }

    let (_, label, payload) = VOCABULARY.iter().find(|(name, _, _)| *name == key)?;
    let label = match payload {
        Payload::Flag => (*label).to_string(),
        Payload::Raw => format!("{label}: {}", tag_value(tag)),
        Payload::Item => format!("{label}: {}", item_label(tag_value(tag), reference)),
    };
    Some(TagFeature::Label(label))
}

fn item_label(value: &str, reference: &ReferenceTable) -> String {
    match value.trim().parse::<i64>() {
        Ok(id) => reference.item_name(id),
        Err(_) => format!("{UNKNOWN} ({value})"),
    }
}

pub fn decode_all<'a, I>(tags: I, reference: &ReferenceTable) -> Vec<TagFeature>
where
    I: IntoIterator<Item = &'a str>,
{
    tags.into_iter()
        .filter_map(|tag| decode(tag, reference))
        .collect()
}

/// Plain labels only, in tag order; the footer shows these.
pub fn labels<'a, I>(tags: I, reference: &ReferenceTable) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    decode_all(tags, reference)
        .into_iter()
        .filter_map(|feature| match feature {
            TagFeature::Label(label) => Some(label),
            _ => None,
        })
        .collect()
}

/// The first powerup weighting tag decides; a malformed one hides any later ones.
pub fn powerups<'a, I>(tags: I) -> Option<Vec<(String, u32)>>
where
    I: IntoIterator<Item = &'a str>,
{
    tags.into_iter()
        .find(|tag| tag.starts_with("powerup_percent="))
        .and_then(decode_powerups)
}

pub fn trainer_difficulty_min<'a, I>(tags: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a str>,
{
    tags.into_iter()
        .find(|tag| tag_key(tag) == TRAINER_DIFFICULTY_MIN)
        .and_then(|tag| tag_value(tag).trim().parse::<f64>().ok())
}
