//! Game state and position controller.

use log::info;

use super::errors::AdventureResult;
use super::inventory::Inventory;
use super::types::EntryPath;
use super::world::{Region, Room, RoomHandle, World, Zone};

/// Records the player's position so an instance can be resumed.
pub trait PositionStore {
    fn record(&mut self, position: &EntryPath) -> AdventureResult<()>;
}

/// Position store that keeps the last recorded path in memory.
#[derive(Debug, Default)]
pub struct MemoryPositions {
    pub history: Vec<EntryPath>,
}

impl PositionStore for MemoryPositions {
    fn record(&mut self, position: &EntryPath) -> AdventureResult<()> {
        self.history.push(position.clone());
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct Character {
    pub inventory: Inventory,
}

impl Character {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Everything the command handlers act on for one loaded instance.
pub struct GameState {
    pub world: World,
    region_id: String,
    zone_id: String,
    room: RoomHandle,
    pub character: Character,
    positions: Box<dyn PositionStore>,
}

impl GameState {
    /// Start at the world's entry chain. Returns `None` when the world has
    /// no resolved entry room.
    pub fn at_entry(world: World, positions: Box<dyn PositionStore>) -> Option<Self> {
        let region = world.entry_region()?;
        let zone = region.entry_zone()?;
        let room = zone.entry()?;
        let region_id = region.id.clone();
        let zone_id = zone.id.clone();

        let mut state = Self {
            world,
            region_id,
            zone_id,
            room,
            character: Character::new(),
            positions,
        };
        state.world.room_mut(room).visited = true;
        Some(state)
    }

    pub fn room_handle(&self) -> RoomHandle {
        self.room
    }

    pub fn room(&self) -> &Room {
        self.world.room(self.room)
    }

    pub fn room_mut(&mut self) -> &mut Room {
        self.world.room_mut(self.room)
    }

    pub fn region(&self) -> Option<&Region> {
        self.world.region(&self.region_id)
    }

    pub fn zone(&self) -> Option<&Zone> {
        self.world.zone(&self.region_id, &self.zone_id)
    }

    pub fn position(&self) -> EntryPath {
        self.world.position_of(self.room)
    }

    /// Move to `handle`, mark it visited and record the new position.
    ///
    /// A failure to record is returned to the caller; the in-memory move
    /// has already happened at that point.
    pub fn update_current_position(&mut self, handle: RoomHandle) -> AdventureResult<()> {
        info!("Updates current position : {}", self.world.room(handle).name);
        self.room = handle;
        let room = self.world.room_mut(handle);
        room.visited = true;
        self.region_id = room.region_id.clone();
        self.zone_id = room.zone_id.clone();

        let path = self.world.position_of(handle);
        self.positions.record(&path)
    }

    /// Borrow the current room's inventory and the character's together.
    pub fn room_and_character(&mut self) -> (&mut Inventory, &mut Inventory) {
        let room = self.world.room_mut(self.room);
        (&mut room.inventory, &mut self.character.inventory)
    }
}
