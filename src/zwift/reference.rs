use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const BUNDLED: &str = include_str!("../../data/reference.toml");

/// Sentinel shown when a route, world or item is not in the table.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("failed to read reference table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse reference table: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct Route {
    id: u64,
    name: String,
    world: String,
    distance_in_meters: f64,
    leadin_distance_in_meters: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct Item {
    id: i64,
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReferenceFile {
    #[serde(default)]
    routes: Vec<Route>,
    #[serde(default)]
    items: Vec<Item>,
}

/// Borrowed view of one route, or of the unknown-route sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteInfo<'a> {
    pub id: Option<u64>,
    pub name: &'a str,
    pub world: &'a str,
    pub distance_in_meters: f64,
    pub leadin_distance_in_meters: f64,
}

impl RouteInfo<'static> {
    pub fn unknown() -> Self {
        Self {
            id: None,
            name: UNKNOWN,
            world: UNKNOWN,
            distance_in_meters: 0.0,
            leadin_distance_in_meters: 0.0,
        }
    }
}

impl RouteInfo<'_> {
    pub fn is_known(&self) -> bool {
        self.id.is_some()
    }
}

/// Static lookup of routes, worlds and equipment items.
#[derive(Debug, Default)]
pub struct ReferenceTable {
    routes: HashMap<u64, Route>,
    items: HashMap<i64, String>,
}

impl ReferenceTable {
    pub fn bundled() -> Result<Self, ReferenceError> {
        Self::parse(BUNDLED)
    }

    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ReferenceError> {
        let file: ReferenceFile = toml::from_str(contents)?;
        Ok(Self {
            routes: file
                .routes
                .into_iter()
                .map(|route| (route.id, route))
                .collect(),
            items: file
                .items
                .into_iter()
                .map(|item| (item.id, item.name))
                .collect(),
        })
    }

    pub fn route(&self, id: u64) -> Option<RouteInfo<'_>> {
        self.routes.get(&id).map(|route| RouteInfo {
            id: Some(route.id),
            name: &route.name,
            world: &route.world,
            distance_in_meters: route.distance_in_meters,
            leadin_distance_in_meters: route.leadin_distance_in_meters,
        })
    }

    pub fn item(&self, id: i64) -> Option<&str> {
        self.items.get(&id).map(String::as_str)
    }

    /// Item name, or `Unknown (<id>)` when the id is not listed.
    pub fn item_name(&self, id: i64) -> String {
        match self.item(id) {
            Some(name) => name.to_string(),
            None => format!("{UNKNOWN} ({id})"),
        }
    }
}
