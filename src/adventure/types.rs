use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Vocabulary
// ============================================================================

/// Compass directions plus a neutral center, used to key room adjacency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    Center,
}

impl Direction {
    /// Every direction in compass order.
    pub const ALL: [Direction; 9] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
        Direction::Center,
    ];

    /// Accepted spellings; the first one is the display label.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Direction::North => &["north", "n"],
            Direction::NorthEast => &["northeast", "north-east", "north_east", "ne"],
            Direction::East => &["east", "e"],
            Direction::SouthEast => &["southeast", "south-east", "south_east", "se"],
            Direction::South => &["south", "s"],
            Direction::SouthWest => &["southwest", "south-west", "south_west", "sw"],
            Direction::West => &["west", "w"],
            Direction::NorthWest => &["northwest", "north-west", "north_west", "nw"],
            Direction::Center => &["center"],
        }
    }

    pub fn label(self) -> &'static str {
        self.aliases()[0]
    }

    /// Case-insensitive alias lookup.
    pub fn parse(input: &str) -> Option<Direction> {
        let wanted = input.trim().to_lowercase();
        Direction::ALL
            .into_iter()
            .find(|dir| dir.aliases().contains(&wanted.as_str()))
    }

    /// Grid offset used by the map renderer (x grows east, y grows south).
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
            Direction::Center => (0, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::parse(s).ok_or_else(|| format!("no matching direction for '{}'", s))
    }
}

/// Senses a room or item may describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sense {
    Inspect,
    Feel,
    Touch,
    Smell,
    Taste,
    Listen,
}

impl Sense {
    pub const ALL: [Sense; 6] = [
        Sense::Inspect,
        Sense::Feel,
        Sense::Touch,
        Sense::Smell,
        Sense::Taste,
        Sense::Listen,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Sense::Inspect => "inspect",
            Sense::Feel => "feel",
            Sense::Touch => "touch",
            Sense::Smell => "smell",
            Sense::Taste => "taste",
            Sense::Listen => "listen",
        }
    }

    pub fn parse(input: &str) -> Option<Sense> {
        let wanted = input.trim().to_lowercase();
        Sense::ALL.into_iter().find(|sense| sense.label() == wanted)
    }

    /// Text shown when nothing is described for this sense.
    pub fn nothing_noticed(self) -> &'static str {
        match self {
            Sense::Inspect => "You notice nothing special.",
            Sense::Feel => "Your instinct tells you nothing.",
            Sense::Touch => "You touch nothing of interest.",
            Sense::Smell => "You smell nothing unusual.",
            Sense::Taste => "You taste nothing in particular.",
            Sense::Listen => "You hear nothing.",
        }
    }
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Items
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Weapon,
    Armor,
    Consumable,
    Key,
    Tool,
    Treasure,
    Misc,
}

/// Immutable item definition loaded from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub kind: ItemType,
    pub short_desc: String,
    pub long_desc: String,
    pub senses: HashMap<Sense, String>,
    pub carriable: bool,
    pub stackable: bool,
}

impl Item {
    /// Non-carriable, non-stackable item with no sense text.
    pub fn new(id: &str, name: &str, kind: ItemType, short_desc: &str, long_desc: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            short_desc: short_desc.to_string(),
            long_desc: long_desc.to_string(),
            senses: HashMap::new(),
            carriable: false,
            stackable: false,
        }
    }

    pub fn carriable(mut self, carriable: bool) -> Self {
        self.carriable = carriable;
        self
    }

    pub fn stackable(mut self, stackable: bool) -> Self {
        self.stackable = stackable;
        self
    }

    pub fn with_sense(mut self, sense: Sense, text: &str) -> Self {
        self.senses.insert(sense, text.to_string());
        self
    }

    pub fn sense(&self, sense: Sense) -> Option<&str> {
        self.senses.get(&sense).map(String::as_str)
    }
}

// ============================================================================
// Story and position
// ============================================================================

/// Top-level descriptor of a story package.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Story {
    pub id: String,
    pub name: String,
    pub description: String,
    /// World entered when no saved position exists.
    #[serde(rename = "entry_point")]
    pub default_world_id: String,
}

/// Saved position `world.region.zone.room`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPath {
    segments: [String; 4],
}

impl EntryPath {
    pub fn new(world: &str, region: &str, zone: &str, room: &str) -> Self {
        Self {
            segments: [
                world.to_string(),
                region.to_string(),
                zone.to_string(),
                room.to_string(),
            ],
        }
    }

    /// Accepts exactly four non-empty dot-separated segments.
    pub fn parse(raw: &str) -> Option<EntryPath> {
        let parts: Vec<&str> = raw.trim().split('.').collect();
        if parts.len() != 4 || parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        Some(EntryPath::new(parts[0], parts[1], parts[2], parts[3]))
    }

    pub fn world(&self) -> &str {
        &self.segments[0]
    }

    pub fn region(&self) -> &str {
        &self.segments[1]
    }

    pub fn zone(&self) -> &str {
        &self.segments[2]
    }

    pub fn room(&self) -> &str {
        &self.segments[3]
    }

    /// Segments below the world level: region, zone, room.
    pub fn below_world(&self) -> &[String] {
        &self.segments[1..]
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}
