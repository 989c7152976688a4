//! Command dispatch engine
//!
//! Maps command identifiers to handlers through an explicit table built at
//! construction time. Each turn runs `AwaitingInput → Parsing → Dispatching
//! → Executing → Rendering → AwaitingInput`; whatever happens the engine is
//! back at `AwaitingInput` when [`CommandEngine::execute`] returns.
//!
//! Command and load failures are recovered here and turned into an error
//! [`Response`]. The only error handed back to the caller is
//! [`AdventureError::PositionWrite`], since a position that cannot be saved
//! is something the host has to decide about.

use std::collections::HashMap;

use log::{debug, error, warn};

use super::commands::{resolve_target, ArgGrammar, Args, Command, ItemArg, Target};
use super::errors::{AdventureError, AdventureResult};
use super::instance::GameSession;
use super::render;
use super::state::GameState;
use super::types::{Direction, Item, Sense};
use crate::logutil::escape_log;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Info,
    Error,
}

/// Output of one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub kind: ResponseKind,
    pub lines: Vec<String>,
    /// The player asked to leave the game.
    pub quit: bool,
}

impl Response {
    pub fn info(lines: Vec<String>) -> Self {
        Self {
            kind: ResponseKind::Info,
            lines,
            quit: false,
        }
    }

    pub fn line(text: impl Into<String>) -> Self {
        Self::info(vec![text.into()])
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::Error,
            lines: vec![text.into()],
            quit: false,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == ResponseKind::Error
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    AwaitingInput,
    Parsing,
    Dispatching,
    Executing,
    Rendering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Help,
    New,
    Load,
    Exit,
    /// `move` carries no direction; bound words like `n` carry theirs.
    Move(Option<Direction>),
    Look,
    Sense(Sense),
    Inventory,
    Map,
    Take,
    Drop,
}

#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub kind: CommandKind,
    pub grammar: ArgGrammar,
    pub usage: String,
    pub summary: &'static str,
    pub details: &'static str,
}

pub struct CommandEngine {
    commands: HashMap<&'static str, CommandSpec>,
    /// Primary command names in help order.
    listing: Vec<&'static str>,
    phase: TurnPhase,
}

impl Default for CommandEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandEngine {
    pub fn new() -> Self {
        let mut engine = Self {
            commands: HashMap::new(),
            listing: Vec::new(),
            phase: TurnPhase::AwaitingInput,
        };

        engine.register(
            "help",
            CommandKind::Help,
            ArgGrammar::OptionalName,
            "help [command]",
            "Show the commands, or details about one of them",
            "Without an argument, lists every command. With a command name, shows its usage.",
        );
        engine.register(
            "new",
            CommandKind::New,
            ArgGrammar::StoryAndName,
            "new [story name]",
            "Start a new game from a story",
            "Without arguments, lists the available stories. With a story and a name, copies \
             the story into a new saved game of that name and starts playing it.",
        );
        engine.register(
            "load",
            CommandKind::Load,
            ArgGrammar::OptionalName,
            "load [name]",
            "Resume a saved game",
            "Without an argument, lists saved games. With a name, resumes that game at the last \
             position reached. Items picked up are not kept between sessions.",
        );
        engine.register(
            "exit",
            CommandKind::Exit,
            ArgGrammar::None,
            "exit",
            "Leave the game",
            "Your position is saved after every move, so nothing is lost by leaving.",
        );
        engine.register(
            "move",
            CommandKind::Move(None),
            ArgGrammar::OptionalDirection,
            "move [direction]",
            "Walk to a neighboring room",
            "Directions: north (n), northeast (ne), east (e), southeast (se), south (s), \
             southwest (sw), west (w), northwest (nw), center. The direction words alone work too.",
        );
        engine.register(
            "look",
            CommandKind::Look,
            ArgGrammar::OptionalTarget,
            "look [direction|item]",
            "Describe the room, a direction or an item",
            "Without an argument, describes the room you are in and its exits. With a direction, \
             gives a glimpse of the room that way. With an item here or in your inventory, \
             describes it.",
        );
        for sense in Sense::ALL {
            let (summary, details) = match sense {
                Sense::Inspect => (
                    "Examine the room or an item closely",
                    "Without an argument, also lists the items lying in the room.",
                ),
                Sense::Feel => ("Get a feeling for the room or an item", ""),
                Sense::Touch => ("Touch the room or an item", ""),
                Sense::Smell => ("Smell the room or an item", ""),
                Sense::Taste => ("Taste the room or an item", ""),
                Sense::Listen => ("Listen to the room or an item", ""),
            };
            engine.register(
                sense.label(),
                CommandKind::Sense(sense),
                ArgGrammar::OptionalTarget,
                &format!("{} [direction|item]", sense.label()),
                summary,
                details,
            );
        }
        engine.register(
            "inventory",
            CommandKind::Inventory,
            ArgGrammar::None,
            "inventory",
            "List what you carry",
            "Alias: i",
        );
        engine.alias("i", "inventory");
        engine.register(
            "map",
            CommandKind::Map,
            ArgGrammar::None,
            "map",
            "Show the rooms of this zone you have visited",
            "@ marks your position, # a visited room, ? a room seen but not yet entered.",
        );
        engine.register(
            "take",
            CommandKind::Take,
            ArgGrammar::ItemQuantity { allow_all: true },
            "take <item|all> [quantity]",
            "Pick up items from the room",
            "The quantity defaults to 1. 'take all' picks up everything in the room.",
        );
        engine.register(
            "drop",
            CommandKind::Drop,
            ArgGrammar::ItemQuantity { allow_all: false },
            "drop <item> [quantity]",
            "Put down items you carry",
            "The quantity defaults to 1.",
        );

        for direction in Direction::ALL {
            if direction == Direction::Center {
                continue;
            }
            for &word in direction.aliases() {
                engine.commands.insert(
                    word,
                    CommandSpec {
                        kind: CommandKind::Move(Some(direction)),
                        grammar: ArgGrammar::None,
                        usage: word.to_string(),
                        summary: "Walk in this direction",
                        details: "Same as move with this direction.",
                    },
                );
            }
        }

        engine
    }

    fn register(
        &mut self,
        name: &'static str,
        kind: CommandKind,
        grammar: ArgGrammar,
        usage: &str,
        summary: &'static str,
        details: &'static str,
    ) {
        self.commands.insert(
            name,
            CommandSpec {
                kind,
                grammar,
                usage: usage.to_string(),
                summary,
                details,
            },
        );
        self.listing.push(name);
    }

    fn alias(&mut self, alias: &'static str, target: &str) {
        if let Some(spec) = self.commands.get(target).cloned() {
            self.commands.insert(alias, spec);
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn spec(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name)
    }

    /// Run one line of player input against the session.
    pub fn execute(&mut self, session: &mut GameSession, input: &str) -> AdventureResult<Response> {
        self.phase = TurnPhase::Parsing;
        let result = self.run(session, input);
        self.phase = TurnPhase::AwaitingInput;

        match result {
            Ok(response) => Ok(response),
            Err(e @ AdventureError::PositionWrite { .. }) => {
                error!("Failed to record position: {}", e);
                Err(e)
            }
            Err(e) if e.is_load_error() => {
                error!("Story data error during '{}': {}", escape_log(input), e);
                Ok(Response::error(describe_error(&e)))
            }
            Err(e) => {
                warn!("Command '{}' failed: {}", escape_log(input), e);
                Ok(Response::error(describe_error(&e)))
            }
        }
    }

    fn run(&mut self, session: &mut GameSession, input: &str) -> AdventureResult<Response> {
        let Some(command) = Command::parse(input) else {
            return Ok(Response::info(Vec::new()));
        };

        self.phase = TurnPhase::Dispatching;
        let spec = self
            .commands
            .get(command.id.as_str())
            .ok_or_else(|| AdventureError::UnknownCommand(command.id.clone()))?;
        let kind = spec.kind;
        let args = spec.grammar.apply(&command, &spec.usage)?;
        debug!("Dispatching {:?} with {:?}", kind, args);

        self.phase = TurnPhase::Executing;
        let response = self.handle(kind, args, session)?;

        self.phase = TurnPhase::Rendering;
        Ok(response)
    }

    fn handle(&self, kind: CommandKind, args: Args, session: &mut GameSession) -> AdventureResult<Response> {
        match (kind, args) {
            (CommandKind::Help, Args::Name(topic)) => self.help(topic.as_deref()),
            (CommandKind::New, Args::NewGame(None)) => list_stories(session),
            (CommandKind::New, Args::NewGame(Some((story, name)))) => {
                session.create_instance(&story, &name)?;
                welcome(session)
            }
            (CommandKind::Load, Args::Name(None)) => list_instances(session),
            (CommandKind::Load, Args::Name(Some(name))) => {
                session.load_instance(&name)?;
                welcome(session)
            }
            (CommandKind::Exit, _) => {
                session.request_exit();
                session.unload();
                Ok(Response {
                    quit: true,
                    ..Response::line("Goodbye.")
                })
            }
            (CommandKind::Move(Some(direction)), _) | (CommandKind::Move(None), Args::Direction(direction)) => {
                move_to(session, direction)
            }
            (CommandKind::Look, Args::Target(raw)) => look(session, &raw),
            (CommandKind::Sense(sense), Args::Target(raw)) => sense_command(session, sense, &raw),
            (CommandKind::Inventory, _) => {
                let (game, _) = session.active()?;
                let mut lines = vec!["You are carrying:".to_string()];
                lines.extend(render::inventory_listing(&game.character.inventory));
                Ok(Response::info(lines))
            }
            (CommandKind::Map, _) => {
                let (game, _) = session.active()?;
                Ok(Response::info(render::zone_map(game)))
            }
            (CommandKind::Take, Args::ItemQuantity { item, quantity }) => take(session, item, quantity),
            (CommandKind::Drop, Args::ItemQuantity { item, quantity }) => drop_item(session, item, quantity),
            (kind, args) => {
                // Grammar and kind are registered together, so this is a table bug.
                error!("No handler for {:?} with {:?}", kind, args);
                Err(AdventureError::UnknownCommand(format!("{:?}", kind)))
            }
        }
    }

    fn help(&self, topic: Option<&str>) -> AdventureResult<Response> {
        if let Some(topic) = topic {
            let name = topic.to_lowercase();
            let spec = self
                .commands
                .get(name.as_str())
                .ok_or(AdventureError::UnknownCommand(name))?;
            let mut lines = vec![format!("Usage: {}", spec.usage), spec.summary.to_string()];
            if !spec.details.is_empty() {
                lines.push(spec.details.to_string());
            }
            return Ok(Response::info(lines));
        }

        let width = self
            .listing
            .iter()
            .filter_map(|name| self.commands.get(name))
            .map(|spec| spec.usage.len())
            .max()
            .unwrap_or(0);
        let mut lines = vec!["Commands:".to_string()];
        for name in &self.listing {
            if let Some(spec) = self.commands.get(name) {
                lines.push(format!("  {:<width$}  {}", spec.usage, spec.summary, width = width));
            }
        }
        lines.push("Direction words (n, ne, e, se, s, sw, w, nw) move you directly.".to_string());
        Ok(Response::info(lines))
    }
}

fn describe_error(err: &AdventureError) -> String {
    match err {
        AdventureError::UnknownCommand(id) => {
            format!("Unknown command '{}'. Type 'help' for a list of commands.", id)
        }
        AdventureError::NoActiveGame => {
            "No game loaded. Use 'new' to start a game or 'load' to resume one.".to_string()
        }
        other => other.to_string(),
    }
}

fn welcome(session: &mut GameSession) -> AdventureResult<Response> {
    let mut lines = Vec::new();
    if let Some(story) = session.story() {
        lines.push(format!("Welcome to {}!", story.name));
        if !story.description.is_empty() {
            lines.push(story.description.clone());
        }
        lines.push(String::new());
    }
    let (game, _) = session.active()?;
    lines.extend(render::room_description(&game.world, game.room_handle()));
    Ok(Response::info(lines))
}

fn list_stories(session: &GameSession) -> AdventureResult<Response> {
    let stories = session.list_stories()?;
    if stories.is_empty() {
        return Ok(Response::line("No stories available."));
    }
    let mut lines = vec!["Available stories:".to_string()];
    for summary in stories {
        lines.push(format!("  {} - {}", summary.dir_name, summary.story.name));
        if !summary.story.description.is_empty() {
            lines.push(format!("      {}", summary.story.description));
        }
    }
    lines.push("Start one with: new <story> <name>".to_string());
    Ok(Response::info(lines))
}

fn list_instances(session: &GameSession) -> AdventureResult<Response> {
    let instances = session.list_instances()?;
    if instances.is_empty() {
        return Ok(Response::line("No saved games."));
    }
    let mut lines = vec!["Saved games:".to_string()];
    for summary in instances {
        let at = summary.record.entry_point.as_deref().unwrap_or("start");
        lines.push(format!("  {} ({}, at {})", summary.name, summary.record.story_id, at));
    }
    lines.push("Resume one with: load <name>".to_string());
    Ok(Response::info(lines))
}

fn move_to(session: &mut GameSession, direction: Direction) -> AdventureResult<Response> {
    let (game, _) = session.active()?;
    let Some(next) = game.room().neighbor(direction) else {
        return Ok(Response::line(format!("You cannot go {} from here.", direction)));
    };
    game.update_current_position(next)?;
    Ok(Response::info(render::room_description(&game.world, next)))
}

/// An item lying in the current room or carried by the player.
fn visible_item<'g>(game: &'g GameState, item_id: &str) -> AdventureResult<&'g Item> {
    game.room()
        .inventory
        .item_slot(item_id)
        .or_else(|| game.character.inventory.item_slot(item_id))
        .map(|slot| slot.item())
        .ok_or_else(|| AdventureError::ItemNotFound(item_id.to_string()))
}

fn look(session: &mut GameSession, raw: &str) -> AdventureResult<Response> {
    let (game, catalog) = session.active()?;
    match resolve_target(raw, catalog)? {
        Target::Here => Ok(Response::info(render::room_description(&game.world, game.room_handle()))),
        Target::Toward(direction) => match game.world.neighbor_of(game.room_handle(), direction) {
            Some(room) if !room.short_desc.is_empty() => Ok(Response::line(room.short_desc.clone())),
            Some(room) => Ok(Response::line(format!("To the {} lies {}.", direction, room.name))),
            None => Ok(Response::line(format!("There is nothing to the {}.", direction))),
        },
        Target::Item(item_id) => {
            let item = visible_item(game, &item_id)?;
            Ok(Response::info(render::item_description(item)))
        }
    }
}

fn sense_command(session: &mut GameSession, sense: Sense, raw: &str) -> AdventureResult<Response> {
    let (game, catalog) = session.active()?;
    match resolve_target(raw, catalog)? {
        Target::Here => {
            let room = game.room();
            let mut lines = vec![render::sense_text(room.sense(sense), sense)];
            if sense == Sense::Inspect {
                lines.push(String::new());
                lines.push("Items here:".to_string());
                lines.extend(render::inventory_listing(&room.inventory));
            }
            Ok(Response::info(lines))
        }
        Target::Toward(direction) => match game.world.neighbor_of(game.room_handle(), direction) {
            Some(room) => Ok(Response::line(render::sense_text(room.sense(sense), sense))),
            None => Ok(Response::line(format!("There is nothing to the {}.", direction))),
        },
        Target::Item(item_id) => {
            let item = visible_item(game, &item_id)?;
            Ok(Response::line(render::sense_text(item.sense(sense), sense)))
        }
    }
}

fn take(session: &mut GameSession, item: ItemArg, quantity: u32) -> AdventureResult<Response> {
    let (game, _) = session.active()?;
    let (room, carried) = game.room_and_character();

    let item_id = match item {
        ItemArg::All => {
            if room.is_empty() {
                return Ok(Response::line("There is nothing to take."));
            }
            let mut lines = vec!["You take:".to_string()];
            lines.extend(render::inventory_listing(room));
            carried.import_inventory(room)?;
            return Ok(Response::info(lines));
        }
        ItemArg::Id(item_id) => item_id,
    };

    // Checked before anything moves so a refusal leaves both sides intact.
    let slot = room
        .item_slot(&item_id)
        .ok_or_else(|| AdventureError::ItemNotFound(item_id.clone()))?;
    if !slot.item().carriable {
        return Err(AdventureError::NotCarriable(slot.item().name.clone()));
    }
    carried.total_after(&item_id, quantity)?;
    let taken = room.remove_item(&item_id, quantity)?;
    carried.add_item(&taken, quantity)?;
    Ok(Response::line(format!("You take {} x{}.", taken.name, quantity)))
}

fn drop_item(session: &mut GameSession, item: ItemArg, quantity: u32) -> AdventureResult<Response> {
    let ItemArg::Id(item_id) = item else {
        return Err(AdventureError::InvalidArguments {
            command: "drop".to_string(),
            usage: "drop <item> [quantity]".to_string(),
        });
    };
    let (game, _) = session.active()?;
    let (room, carried) = game.room_and_character();
    room.total_after(&item_id, quantity)?;
    let dropped = carried.remove_item(&item_id, quantity)?;
    room.add_item(&dropped, quantity)?;
    Ok(Response::line(format!("You drop {} x{}.", dropped.name, quantity)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_session() -> (tempfile::TempDir, GameSession) {
        let tmp = tempfile::tempdir().unwrap();
        let session = GameSession::new(tmp.path().join("stories"), tmp.path().join("saves"));
        (tmp, session)
    }

    #[test]
    fn every_direction_word_is_bound() {
        let engine = CommandEngine::new();
        for word in ["n", "ne", "e", "se", "s", "sw", "w", "nw", "north", "south-west"] {
            let spec = engine.spec(word).unwrap_or_else(|| panic!("{} not bound", word));
            assert!(matches!(spec.kind, CommandKind::Move(Some(_))));
        }
        assert_eq!(
            engine.spec("nw").unwrap().kind,
            CommandKind::Move(Some(Direction::NorthWest))
        );
        assert!(engine.spec("center").is_none());
    }

    #[test]
    fn unknown_command_is_reported_and_engine_returns_to_idle() {
        let (_tmp, mut session) = idle_session();
        let mut engine = CommandEngine::new();
        let response = engine.execute(&mut session, "dance wildly").unwrap();
        assert!(response.is_error());
        assert!(response.text().contains("Unknown command 'dance'"));
        assert_eq!(engine.phase(), TurnPhase::AwaitingInput);
    }

    #[test]
    fn game_commands_need_a_loaded_game() {
        let (_tmp, mut session) = idle_session();
        let mut engine = CommandEngine::new();
        for input in ["look", "n", "inventory", "i", "map", "take all", "drop coin", "smell"] {
            let response = engine.execute(&mut session, input).unwrap();
            assert!(response.is_error(), "{} should fail", input);
            assert!(response.text().starts_with("No game loaded"), "{}", input);
        }
    }

    #[test]
    fn bad_arguments_show_usage() {
        let (_tmp, mut session) = idle_session();
        let mut engine = CommandEngine::new();
        let response = engine.execute(&mut session, "look a b").unwrap();
        assert!(response.is_error());
        assert!(response.text().contains("look [direction|item]"));
        let response = engine.execute(&mut session, "n now").unwrap();
        assert!(response.is_error());
    }

    #[test]
    fn help_lists_commands_and_details() {
        let (_tmp, mut session) = idle_session();
        let mut engine = CommandEngine::new();
        let listing = engine.execute(&mut session, "help").unwrap();
        for name in ["help", "new", "load", "exit", "move", "look", "listen", "inventory", "map", "take", "drop"] {
            assert!(listing.text().contains(name), "help is missing {}", name);
        }
        let take = engine.execute(&mut session, "HELP take").unwrap();
        assert!(take.text().starts_with("Usage: take <item|all> [quantity]"));
        let unknown = engine.execute(&mut session, "help fly").unwrap();
        assert!(unknown.is_error());
    }

    #[test]
    fn blank_input_is_a_no_op() {
        let (_tmp, mut session) = idle_session();
        let mut engine = CommandEngine::new();
        let response = engine.execute(&mut session, "   ").unwrap();
        assert!(!response.is_error());
        assert!(response.lines.is_empty());
    }

    #[test]
    fn exit_requests_quit() {
        let (_tmp, mut session) = idle_session();
        let mut engine = CommandEngine::new();
        let response = engine.execute(&mut session, "exit").unwrap();
        assert!(response.quit);
        assert!(session.exit_requested());
    }

    #[test]
    fn listings_without_content() {
        let (_tmp, mut session) = idle_session();
        let mut engine = CommandEngine::new();
        assert_eq!(engine.execute(&mut session, "new").unwrap().text(), "No stories available.");
        assert_eq!(engine.execute(&mut session, "load").unwrap().text(), "No saved games.");
    }
}
