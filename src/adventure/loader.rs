//! Description loader
//!
//! Builds the world graph and the item catalog of one game instance from
//! JSON description files:
//!
//! ```text
//! <instance>/story.json
//! <instance>/worlds/<world>/world.json
//! <instance>/worlds/<world>/<region>/region.json
//! <instance>/worlds/<world>/<region>/<zone>/zone.json
//! <instance>/worlds/<world>/<region>/<zone>/rooms/<room>.json
//! <instance>/items/<item>.json
//! ```
//!
//! Only the entry chain is loaded: one region per world, one zone per region,
//! and every room reachable from the zone's entry room.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::adventure::errors::{AdventureError, AdventureResult};
use crate::adventure::inventory::Inventory;
use crate::adventure::types::{Direction, EntryPath, Item, ItemType, Sense, Story};
use crate::adventure::world::{Region, Room, RoomHandle, World, Zone};
use crate::validation::validate_description_id;

pub const STORY_FILE: &str = "story.json";
const WORLDS_DIR: &str = "worlds";
const ITEMS_DIR: &str = "items";
const ROOMS_DIR: &str = "rooms";

/// Read-only item lookup handed to the command layer.
pub trait ItemCatalog {
    /// Cheap existence check used to disambiguate command arguments.
    fn item_exists(&self, item_id: &str) -> bool;

    fn load_item(&self, item_id: &str) -> AdventureResult<Item>;
}

// ============================================================================
// Description file formats
// ============================================================================

/// Shared shape of world, region and zone descriptors.
#[derive(Debug, Deserialize)]
struct ContainerSeed {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    entry_point: String,
}

#[derive(Debug, Deserialize)]
struct RoomSeed {
    id: String,
    name: String,
    #[serde(default)]
    short_description: String,
    #[serde(default)]
    long_description: String,
    #[serde(default)]
    directions: BTreeMap<String, ExitSeed>,
    #[serde(default)]
    senses: BTreeMap<String, String>,
    #[serde(default)]
    items: Vec<ItemRefSeed>,
}

#[derive(Debug, Default, Deserialize)]
struct ExitSeed {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemRefSeed {
    id: String,
    #[serde(default = "default_quantity")]
    quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct ItemSeed {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: ItemType,
    #[serde(default)]
    short_description: String,
    #[serde(default)]
    long_description: String,
    #[serde(default)]
    carriable: bool,
    #[serde(default)]
    stackable: bool,
    #[serde(default)]
    senses: BTreeMap<String, String>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> AdventureResult<T> {
    if !path.exists() {
        return Err(AdventureError::NotFound(path.display().to_string()));
    }
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| AdventureError::malformed(path, e.to_string()))
}

fn parse_senses(path: &Path, raw: BTreeMap<String, String>) -> AdventureResult<HashMap<Sense, String>> {
    let mut senses = HashMap::new();
    for (key, text) in raw {
        let sense = Sense::parse(&key)
            .ok_or_else(|| AdventureError::malformed(path, format!("unknown sense '{}'", key)))?;
        let text = text.trim();
        if !text.is_empty() {
            senses.insert(sense, text.to_string());
        }
    }
    Ok(senses)
}

fn checked_id(path: &Path, id: &str) -> AdventureResult<String> {
    validate_description_id(id)
        .map(str::to_string)
        .map_err(|e| AdventureError::malformed(path, format!("id '{}': {}", id, e)))
}

/// The declared id must match the directory or file it was found under,
/// otherwise saved positions and neighbor lookups would not resolve.
fn expect_id(path: &Path, declared: &str, expected: &str) -> AdventureResult<()> {
    if declared != expected {
        return Err(AdventureError::malformed(
            path,
            format!("declares id '{}' but is stored as '{}'", declared, expected),
        ));
    }
    Ok(())
}

/// Pick the child to descend into: the next saved path segment when one is
/// left, the descriptor's default entry point otherwise.
fn next_entry<'p>(default: &str, remaining: Option<&'p [String]>) -> (String, Option<&'p [String]>) {
    match remaining.and_then(|segments| segments.split_first()) {
        Some((head, rest)) => (head.clone(), Some(rest)),
        None => (default.to_string(), None),
    }
}

/// A registered room whose exits are not connected yet.
struct PendingRoom {
    handle: RoomHandle,
    id: String,
    exits: Vec<PendingExit>,
}

struct PendingExit {
    direction: Direction,
    target: String,
    text: Option<String>,
}

// ============================================================================
// Loader
// ============================================================================

/// Loader bound to one instance directory.
pub struct Loader {
    instance_dir: PathBuf,
    worlds_dir: PathBuf,
    items_dir: PathBuf,
    items: RefCell<HashMap<String, Item>>,
}

impl Loader {
    pub fn new<P: AsRef<Path>>(instance_dir: P) -> Self {
        let instance_dir = instance_dir.as_ref().to_path_buf();
        Self {
            worlds_dir: instance_dir.join(WORLDS_DIR),
            items_dir: instance_dir.join(ITEMS_DIR),
            instance_dir,
            items: RefCell::new(HashMap::new()),
        }
    }

    pub fn instance_dir(&self) -> &Path {
        &self.instance_dir
    }

    /// Read a story descriptor from an arbitrary file.
    pub fn read_story<P: AsRef<Path>>(path: P) -> AdventureResult<Story> {
        let path = path.as_ref();
        let story: Story = read_json(path)?;
        if story.default_world_id.trim().is_empty() {
            return Err(AdventureError::malformed(path, "story has no entry_point world"));
        }
        Ok(story)
    }

    pub fn load_story(&self) -> AdventureResult<Story> {
        Self::read_story(self.instance_dir.join(STORY_FILE))
    }

    /// Load a world along its entry chain.
    ///
    /// `entry` overrides the default entry points below the world level,
    /// one segment per level.
    pub fn load_world(&self, world_id: &str, entry: Option<&EntryPath>) -> AdventureResult<World> {
        validate_description_id(world_id)
            .map_err(|e| AdventureError::InvalidIdentifier(format!("{}: {}", world_id, e)))?;

        let world_dir = self.worlds_dir.join(world_id);
        if !world_dir.is_dir() {
            return Err(AdventureError::NotFound(world_dir.display().to_string()));
        }
        let path = world_dir.join("world.json");
        let seed: ContainerSeed = read_json(&path)?;
        expect_id(&path, &seed.id, world_id)?;
        info!("Loading world {{id={}, name={}}}", seed.id, seed.name);

        let mut world = World::new(&seed.id, &seed.name, &seed.description);
        let (region_id, rest) = next_entry(&seed.entry_point, entry.map(EntryPath::below_world));
        let region_id = checked_id(&path, &region_id)?;
        let region = self.load_region(&world_dir.join(&region_id), &region_id, &mut world, rest)?;
        world.set_entry(region);
        Ok(world)
    }

    fn load_region(
        &self,
        dir: &Path,
        region_id: &str,
        world: &mut World,
        remaining: Option<&[String]>,
    ) -> AdventureResult<Region> {
        let path = dir.join("region.json");
        let seed: ContainerSeed = read_json(&path)?;
        expect_id(&path, &seed.id, region_id)?;
        info!("Loading region {{id={}, name={}}}", seed.id, seed.name);

        let mut region = Region::new(&seed.id, &seed.name, &seed.description);
        let (zone_id, rest) = next_entry(&seed.entry_point, remaining);
        let zone_id = checked_id(&path, &zone_id)?;
        let zone = self.load_zone(&dir.join(&zone_id), &zone_id, world, &region.id, rest)?;
        region.set_entry(zone);
        Ok(region)
    }

    fn load_zone(
        &self,
        dir: &Path,
        zone_id: &str,
        world: &mut World,
        region_id: &str,
        remaining: Option<&[String]>,
    ) -> AdventureResult<Zone> {
        let path = dir.join("zone.json");
        let seed: ContainerSeed = read_json(&path)?;
        expect_id(&path, &seed.id, zone_id)?;
        info!("Loading zone {{id={}, name={}}}", seed.id, seed.name);

        let mut zone = Zone::new(&seed.id, &seed.name, &seed.description);
        let (room_id, _) = next_entry(&seed.entry_point, remaining);
        let room_id = checked_id(&path, &room_id)?;
        let entry = self.load_room(&dir.join(ROOMS_DIR), &room_id, world, &mut zone, region_id)?;
        zone.set_entry(entry);
        Ok(zone)
    }

    /// Load a room and every room reachable from it.
    ///
    /// Each room is registered in the zone as soon as it is read, before any
    /// of its exits are resolved, so a neighbor that is already registered is
    /// reused instead of loaded again. This is what terminates cycles. Rooms
    /// whose exits are still unresolved wait on an explicit stack, which keeps
    /// long corridors off the call stack.
    fn load_room(
        &self,
        rooms_dir: &Path,
        room_id: &str,
        world: &mut World,
        zone: &mut Zone,
        region_id: &str,
    ) -> AdventureResult<RoomHandle> {
        let entry = self.read_room(rooms_dir, room_id, world, zone, region_id)?;
        let entry_handle = entry.handle;
        let mut pending = vec![entry];

        while let Some(PendingRoom { handle, id, exits }) = pending.pop() {
            for exit in exits {
                debug!(
                    "Adding neighbor to {} room {{direction={}, id={}}}",
                    id, exit.direction, exit.target
                );
                let next = match zone.room(&exit.target) {
                    Some(existing) => existing,
                    None => {
                        let next_path = rooms_dir.join(format!("{}.json", exit.target));
                        if !next_path.exists() {
                            return Err(AdventureError::NotFound(format!(
                                "room '{}' referenced from '{}' ({})",
                                exit.target,
                                id,
                                next_path.display()
                            )));
                        }
                        let loaded = self.read_room(rooms_dir, &exit.target, world, zone, region_id)?;
                        let next = loaded.handle;
                        pending.push(loaded);
                        next
                    }
                };
                world.room_mut(handle).connect(exit.direction, next, exit.text);
            }
        }

        Ok(entry_handle)
    }

    /// Read one room file, allocate and register the room, and return its
    /// exits for the caller to resolve.
    fn read_room(
        &self,
        rooms_dir: &Path,
        room_id: &str,
        world: &mut World,
        zone: &mut Zone,
        region_id: &str,
    ) -> AdventureResult<PendingRoom> {
        let path = rooms_dir.join(format!("{}.json", room_id));
        let seed: RoomSeed = read_json(&path)?;
        expect_id(&path, &seed.id, room_id)?;
        info!("Loading room {{id={}, name={}}}", seed.id, seed.name);

        let mut room = Room::new(
            &seed.id,
            &seed.name,
            seed.short_description.trim(),
            seed.long_description.trim(),
            region_id,
            &zone.id,
        );
        room.senses = parse_senses(&path, seed.senses)?;
        room.inventory = self.load_room_items(&path, &seed.items)?;

        let mut exits = Vec::new();
        for (key, exit) in seed.directions {
            let direction = Direction::parse(&key)
                .ok_or_else(|| AdventureError::malformed(&path, format!("unknown direction '{}'", key)))?;
            let Some(target) = exit.id else {
                continue;
            };
            exits.push(PendingExit {
                direction,
                target: checked_id(&path, &target)?,
                text: exit.text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
            });
        }

        let handle = world.alloc_room(room);
        zone.register(room_id, handle);
        Ok(PendingRoom {
            handle,
            id: room_id.to_string(),
            exits,
        })
    }

    fn load_room_items(&self, path: &Path, refs: &[ItemRefSeed]) -> AdventureResult<Inventory> {
        let mut local = Inventory::new();
        for item_ref in refs {
            if item_ref.quantity == 0 {
                return Err(AdventureError::malformed(
                    path,
                    format!("item '{}' has quantity 0", item_ref.id),
                ));
            }
            let item = self.load_item(&item_ref.id)?;
            if !item.carriable {
                warn!(
                    "Skipping non-carriable item {} placed in {}",
                    item.id,
                    path.display()
                );
                continue;
            }
            local.add_item(&item, item_ref.quantity).map_err(|e| match e {
                AdventureError::QuantityOverflow(id) => AdventureError::malformed(
                    path,
                    format!("item '{}' adds up to more than {} units", id, u32::MAX),
                ),
                other => other,
            })?;
        }
        Ok(local)
    }

    fn read_item(&self, item_id: &str) -> AdventureResult<Item> {
        let path = self.items_dir.join(format!("{}.json", item_id));
        let seed: ItemSeed = read_json(&path)?;
        expect_id(&path, &seed.id, item_id)?;
        debug!("Loading item {{id={}, name={}}}", seed.id, seed.name);

        Ok(Item {
            senses: parse_senses(&path, seed.senses)?,
            id: seed.id,
            name: seed.name,
            kind: seed.kind,
            short_desc: seed.short_description.trim().to_string(),
            long_desc: seed.long_description.trim().to_string(),
            carriable: seed.carriable,
            stackable: seed.stackable,
        })
    }
}

impl ItemCatalog for Loader {
    fn item_exists(&self, item_id: &str) -> bool {
        if validate_description_id(item_id).is_err() {
            return false;
        }
        self.items.borrow().contains_key(item_id)
            || self.items_dir.join(format!("{}.json", item_id)).is_file()
    }

    fn load_item(&self, item_id: &str) -> AdventureResult<Item> {
        validate_description_id(item_id)
            .map_err(|e| AdventureError::InvalidIdentifier(format!("{}: {}", item_id, e)))?;
        if let Some(item) = self.items.borrow().get(item_id) {
            return Ok(item.clone());
        }
        let item = self.read_item(item_id)?;
        self.items
            .borrow_mut()
            .insert(item_id.to_string(), item.clone());
        Ok(item)
    }
}
