//! # Shadowtext - single-player text adventures
//!
//! Shadowtext plays interactive fiction described entirely by data files. A
//! story package is a tree of JSON descriptors (worlds, regions, zones,
//! rooms and items); the engine loads it into a navigable graph and runs a
//! small command language against it.
//!
//! ## Features
//!
//! - **Data-driven worlds**: rooms, exits and items come from JSON files, loaded lazily along the entry chain.
//! - **Saved games**: each game is a copy of a story with its last position recorded after every move.
//! - **Commands**: movement by direction word, `look` and five other senses, `take`/`drop`, `inventory` and a fog-of-war `map`.
//! - **Inventories**: stackable and non-stackable items with quantities that are never created or lost in a transfer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shadowtext::adventure::{CommandEngine, GameSession};
//!
//! fn main() -> Result<(), shadowtext::adventure::AdventureError> {
//!     let mut session = GameSession::new("data/stories", "data/saves");
//!     let mut engine = CommandEngine::new();
//!
//!     for line in ["new manor my-save", "look", "n", "take all", "inventory"] {
//!         let response = engine.execute(&mut session, line)?;
//!         println!("{}", response.text());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`adventure`] - loader, world graph, inventories, command engine, saved instances
//! - [`config`] - TOML configuration
//! - [`validation`] - identifier checks for anything that becomes a path
//! - [`logutil`] - single-line log sanitizing

pub mod adventure;
pub mod config;
pub mod logutil;
pub mod validation;
