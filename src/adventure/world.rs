//! World graph: the World ⊃ Region ⊃ Zone ⊃ Room containment tree and the
//! room adjacency layer.
//!
//! Rooms live in an arena owned by the [`World`] and are addressed by
//! [`RoomHandle`]. Zones map room ids to handles, and rooms map directions to
//! handles, so adjacency may be cyclic while ownership stays a tree.

use std::collections::HashMap;

use super::inventory::Inventory;
use super::types::{Direction, EntryPath, Sense};

/// Stable index of a room in its world's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomHandle(usize);

impl RoomHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub short_desc: String,
    pub long_desc: String,
    pub senses: HashMap<Sense, String>,
    neighbors: HashMap<Direction, RoomHandle>,
    exit_text: HashMap<Direction, String>,
    /// Back-reference used to rebuild the saved position.
    pub region_id: String,
    pub zone_id: String,
    pub inventory: Inventory,
    pub visited: bool,
}

impl Room {
    pub fn new(
        id: &str,
        name: &str,
        short_desc: &str,
        long_desc: &str,
        region_id: &str,
        zone_id: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            short_desc: short_desc.to_string(),
            long_desc: long_desc.to_string(),
            senses: HashMap::new(),
            neighbors: HashMap::new(),
            exit_text: HashMap::new(),
            region_id: region_id.to_string(),
            zone_id: zone_id.to_string(),
            inventory: Inventory::new(),
            visited: false,
        }
    }

    /// Wire a one-way edge; the target room is not touched.
    pub fn connect(&mut self, direction: Direction, target: RoomHandle, text: Option<String>) {
        self.neighbors.insert(direction, target);
        match text {
            Some(text) => {
                self.exit_text.insert(direction, text);
            }
            None => {
                self.exit_text.remove(&direction);
            }
        }
    }

    pub fn neighbor(&self, direction: Direction) -> Option<RoomHandle> {
        self.neighbors.get(&direction).copied()
    }

    pub fn has_neighbor(&self, direction: Direction) -> bool {
        self.neighbors.contains_key(&direction)
    }

    /// Flavor text for the passage, independent of the neighbor's own text.
    pub fn exit_text(&self, direction: Direction) -> Option<&str> {
        self.exit_text.get(&direction).map(String::as_str)
    }

    /// Available exits in compass order.
    pub fn exits(&self) -> Vec<(Direction, RoomHandle)> {
        Direction::ALL
            .into_iter()
            .filter_map(|dir| self.neighbor(dir).map(|h| (dir, h)))
            .collect()
    }

    pub fn sense(&self, sense: Sense) -> Option<&str> {
        self.senses.get(&sense).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub description: String,
    rooms: HashMap<String, RoomHandle>,
    entry: Option<RoomHandle>,
}

impl Zone {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            rooms: HashMap::new(),
            entry: None,
        }
    }

    pub fn register(&mut self, room_id: &str, handle: RoomHandle) {
        self.rooms.insert(room_id.to_string(), handle);
    }

    pub fn room(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms.get(room_id).copied()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room_handles(&self) -> impl Iterator<Item = RoomHandle> + '_ {
        self.rooms.values().copied()
    }

    pub fn entry(&self) -> Option<RoomHandle> {
        self.entry
    }

    pub fn set_entry(&mut self, handle: RoomHandle) {
        self.entry = Some(handle);
    }
}

#[derive(Debug, Clone)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub description: String,
    zones: HashMap<String, Zone>,
    entry: Option<String>,
}

impl Region {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            zones: HashMap::new(),
            entry: None,
        }
    }

    /// Insert a zone and make it the entry point.
    pub fn set_entry(&mut self, zone: Zone) {
        self.entry = Some(zone.id.clone());
        self.zones.insert(zone.id.clone(), zone);
    }

    pub fn zone(&self, zone_id: &str) -> Option<&Zone> {
        self.zones.get(zone_id)
    }

    pub fn entry_zone(&self) -> Option<&Zone> {
        self.entry.as_deref().and_then(|id| self.zones.get(id))
    }
}

#[derive(Debug, Clone)]
pub struct World {
    pub id: String,
    pub name: String,
    pub description: String,
    regions: HashMap<String, Region>,
    entry: Option<String>,
    rooms: Vec<Room>,
}

impl World {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            regions: HashMap::new(),
            entry: None,
            rooms: Vec::new(),
        }
    }

    /// Move a room into the arena.
    pub fn alloc_room(&mut self, room: Room) -> RoomHandle {
        self.rooms.push(room);
        RoomHandle(self.rooms.len() - 1)
    }

    /// Insert a region and make it the entry point.
    pub fn set_entry(&mut self, region: Region) {
        self.entry = Some(region.id.clone());
        self.regions.insert(region.id.clone(), region);
    }

    pub fn region(&self, region_id: &str) -> Option<&Region> {
        self.regions.get(region_id)
    }

    pub fn entry_region(&self) -> Option<&Region> {
        self.entry.as_deref().and_then(|id| self.regions.get(id))
    }

    pub fn zone(&self, region_id: &str, zone_id: &str) -> Option<&Zone> {
        self.region(region_id).and_then(|r| r.zone(zone_id))
    }

    /// Handles come from this world's arena, so indexing cannot fail.
    pub fn room(&self, handle: RoomHandle) -> &Room {
        &self.rooms[handle.0]
    }

    pub fn room_mut(&mut self, handle: RoomHandle) -> &mut Room {
        &mut self.rooms[handle.0]
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Room reached from `from` going `direction`, if any.
    pub fn neighbor_of(&self, from: RoomHandle, direction: Direction) -> Option<&Room> {
        self.room(from).neighbor(direction).map(|h| self.room(h))
    }

    /// Dotted path of a room for persistence.
    pub fn position_of(&self, handle: RoomHandle) -> EntryPath {
        let room = self.room(handle);
        EntryPath::new(&self.id, &room.region_id, &room.zone_id, &room.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_room_world() -> (World, RoomHandle, RoomHandle) {
        let mut world = World::new("w1", "World", "");
        let hall = world.alloc_room(Room::new("hall", "Hall", "a hall", "A long hall", "r1", "z1"));
        let cellar = world.alloc_room(Room::new("cellar", "Cellar", "a cellar", "A damp cellar", "r1", "z1"));
        world
            .room_mut(hall)
            .connect(Direction::South, cellar, Some("Stairs lead down.".to_string()));
        (world, hall, cellar)
    }

    #[test]
    fn adjacency_is_one_way() {
        let (world, hall, cellar) = two_room_world();
        assert_eq!(world.room(hall).neighbor(Direction::South), Some(cellar));
        assert!(world.room(cellar).neighbor(Direction::North).is_none());
        assert_eq!(world.room(hall).exit_text(Direction::South), Some("Stairs lead down."));
    }

    #[test]
    fn exits_follow_compass_order() {
        let (mut world, hall, cellar) = two_room_world();
        world.room_mut(hall).connect(Direction::North, cellar, None);
        let exits: Vec<Direction> = world.room(hall).exits().into_iter().map(|(d, _)| d).collect();
        assert_eq!(exits, vec![Direction::North, Direction::South]);
    }

    #[test]
    fn position_path_uses_back_references() {
        let (world, _, cellar) = two_room_world();
        assert_eq!(world.position_of(cellar).to_string(), "w1.r1.z1.cellar");
    }

    #[test]
    fn entry_points_resolve_through_the_hierarchy() {
        let (mut world, hall, _) = two_room_world();
        let mut zone = Zone::new("z1", "Zone", "");
        zone.register("hall", hall);
        zone.set_entry(hall);
        let mut region = Region::new("r1", "Region", "");
        region.set_entry(zone);
        world.set_entry(region);

        let zone = world.entry_region().and_then(|r| r.entry_zone()).unwrap();
        assert_eq!(zone.entry(), Some(hall));
        assert_eq!(zone.room("hall"), Some(hall));
        assert!(world.zone("r1", "z1").is_some());
    }
}
