//! Plain-text rendering of rooms, items, inventories and the zone map.

use std::collections::{BTreeMap, HashMap, VecDeque};

use super::inventory::Inventory;
use super::state::GameState;
use super::types::{Direction, Item, Sense};
use super::world::{RoomHandle, World};

pub const EMPTY_INVENTORY: &str = "There are no items.";

/// Name banner, long description, then one line per available exit.
pub fn room_description(world: &World, handle: RoomHandle) -> Vec<String> {
    let room = world.room(handle);
    let mut lines = vec![format!("## {} ##", room.name), String::new(), room.long_desc.clone()];

    let exits = room.exits();
    if !exits.is_empty() {
        lines.push(String::new());
        let width = Direction::ALL.iter().map(|d| d.label().len()).max().unwrap_or(0);
        for (direction, _) in exits {
            let text = room.exit_text(direction).unwrap_or("");
            lines.push(format!("  {:<width$}  {}", direction.label(), text, width = width));
        }
    }
    lines
}

pub fn item_description(item: &Item) -> Vec<String> {
    vec![format!("## {} ##", item.name), String::new(), item.long_desc.clone()]
}

/// Sense text, or the sense's default when nothing is described.
pub fn sense_text(described: Option<&str>, sense: Sense) -> String {
    described.unwrap_or(sense.nothing_noticed()).to_string()
}

/// Non-stackable slots with more units than this get a single `xN` line.
pub const MAX_EXPANDED_UNITS: u32 = 10;

/// One line per slot; non-stackable items get one line per unit, up to
/// `MAX_EXPANDED_UNITS`.
pub fn inventory_listing(inventory: &Inventory) -> Vec<String> {
    if inventory.is_empty() {
        return vec![EMPTY_INVENTORY.to_string()];
    }
    let mut lines = Vec::new();
    for slot in inventory.slots() {
        let item = slot.item();
        if item.stackable || slot.quantity() > MAX_EXPANDED_UNITS {
            lines.push(format!("x{}  [{}] ({})", slot.quantity(), item.name, item.id));
        } else {
            for _ in 0..slot.quantity() {
                lines.push(format!("x1  [{}] ({})", item.name, item.id));
            }
        }
    }
    lines
}

/// Fog-of-war map of the current zone: `@` you, `#` visited, `?` seen from
/// a visited room, blank unknown. Rooms are laid out by walking exits from
/// the current room; when two rooms land on the same cell the first wins.
pub fn zone_map(state: &GameState) -> Vec<String> {
    let world = &state.world;
    let start = state.room_handle();

    let mut coords: HashMap<RoomHandle, (i32, i32)> = HashMap::new();
    let mut cells: BTreeMap<(i32, i32), RoomHandle> = BTreeMap::new();
    let mut queue = VecDeque::new();
    coords.insert(start, (0, 0));
    cells.insert((0, 0), start);
    queue.push_back(start);

    while let Some(handle) = queue.pop_front() {
        let room = world.room(handle);
        if !room.visited {
            continue;
        }
        let (x, y) = coords[&handle];
        for (direction, next) in room.exits() {
            if direction == Direction::Center || coords.contains_key(&next) {
                continue;
            }
            let (dx, dy) = direction.offset();
            let cell = (x + dx, y + dy);
            if cells.contains_key(&cell) {
                continue;
            }
            coords.insert(next, cell);
            cells.insert(cell, next);
            queue.push_back(next);
        }
    }

    let min_x = cells.keys().map(|c| c.0).min().unwrap_or(0);
    let max_x = cells.keys().map(|c| c.0).max().unwrap_or(0);
    let min_y = cells.keys().map(|c| c.1).min().unwrap_or(0);
    let max_y = cells.keys().map(|c| c.1).max().unwrap_or(0);

    let mut lines = Vec::new();
    if let Some(zone) = state.zone() {
        lines.push(format!("## {} ##", zone.name));
    }
    for y in min_y..=max_y {
        let mut row = String::new();
        for x in min_x..=max_x {
            let symbol = match cells.get(&(x, y)) {
                Some(&h) if h == start => '@',
                Some(&h) if world.room(h).visited => '#',
                Some(_) => '?',
                None => ' ',
            };
            row.push(symbol);
        }
        lines.push(row.trim_end().to_string());
    }

    let mut visited: Vec<&str> = coords
        .keys()
        .map(|&h| world.room(h))
        .filter(|room| room.visited)
        .map(|room| room.name.as_str())
        .collect();
    visited.sort_unstable();
    lines.push(String::new());
    lines.push(format!("Visited: {}", visited.join(", ")));
    lines
}
