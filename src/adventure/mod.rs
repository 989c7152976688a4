//! Text-adventure core: description loading, the world graph, inventories
//! and the command engine that drives a game instance.
//! Everything here is synchronous; the binary owns the async runtime.

pub mod commands;
pub mod dispatch;
pub mod errors;
pub mod instance;
pub mod inventory;
pub mod loader;
pub mod render;
pub mod state;
pub mod types;
pub mod world;

pub use commands::{resolve_target, ArgGrammar, Args, Command, ItemArg, Target, ALL_ITEMS, NO_TARGET};
pub use dispatch::{CommandEngine, CommandKind, CommandSpec, Response, ResponseKind, TurnPhase};
pub use errors::{AdventureError, AdventureResult};
pub use instance::{
    GameSession, InstanceFile, InstanceLock, InstanceRecord, InstanceSummary, StorySummary,
    INSTANCE_FILE, LOCK_FILE,
};
pub use inventory::{Inventory, ItemSlot};
pub use loader::{ItemCatalog, Loader, STORY_FILE};
pub use state::{Character, GameState, MemoryPositions, PositionStore};
pub use types::*;
pub use world::{Region, Room, RoomHandle, World, Zone};
