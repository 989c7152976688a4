//! Command model: tokenizing player input, checking it against a per-command
//! argument grammar, and resolving look/sense targets.

use log::debug;

use crate::adventure::errors::{AdventureError, AdventureResult};
use crate::adventure::loader::ItemCatalog;
use crate::adventure::types::Direction;
use crate::logutil::escape_log;

/// Target value standing for "no target given".
pub const NO_TARGET: &str = "none";

/// Keyword accepted by `take` in place of an item id.
pub const ALL_ITEMS: &str = "all";

/// Raw input split into a command identifier and positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: String,
    pub args: Vec<String>,
}

impl Command {
    /// Whitespace tokenizer. The identifier is lower-cased; blank input
    /// yields `None`.
    pub fn parse(input: &str) -> Option<Command> {
        let mut tokens = input.split_whitespace();
        let id = tokens.next()?.to_lowercase();
        let args: Vec<String> = tokens.map(str::to_string).collect();
        debug!("Parsed command: id={} args={:?}", escape_log(&id), args);
        Some(Command { id, args })
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn has_args(&self) -> bool {
        !self.args.is_empty()
    }
}

/// Item argument of take/drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemArg {
    All,
    Id(String),
}

/// Arguments after grammar validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Args {
    None,
    Name(Option<String>),
    NewGame(Option<(String, String)>),
    Direction(Direction),
    /// Target as typed, `NO_TARGET` when omitted.
    Target(String),
    ItemQuantity { item: ItemArg, quantity: u32 },
}

/// Shape of the arguments a command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgGrammar {
    None,
    /// `help [command]`, `load [instance]`
    OptionalName,
    /// `new` or `new <story> <instance>`
    StoryAndName,
    /// `move [direction]`, defaults to center
    OptionalDirection,
    /// `look [direction|item]`
    OptionalTarget,
    /// `take <item|all> [qty]`, `drop <item> [qty]`
    ItemQuantity { allow_all: bool },
}

impl ArgGrammar {
    pub fn apply(self, command: &Command, usage: &str) -> AdventureResult<Args> {
        let invalid = || AdventureError::InvalidArguments {
            command: command.id.clone(),
            usage: usage.to_string(),
        };
        let args = &command.args;

        match self {
            ArgGrammar::None => {
                if args.is_empty() {
                    Ok(Args::None)
                } else {
                    Err(invalid())
                }
            }
            ArgGrammar::OptionalName => match args.as_slice() {
                [] => Ok(Args::Name(None)),
                [name] => Ok(Args::Name(Some(name.clone()))),
                _ => Err(invalid()),
            },
            ArgGrammar::StoryAndName => match args.as_slice() {
                [] => Ok(Args::NewGame(None)),
                [story, name] => Ok(Args::NewGame(Some((story.clone(), name.clone())))),
                _ => Err(invalid()),
            },
            ArgGrammar::OptionalDirection => match args.as_slice() {
                [] => Ok(Args::Direction(Direction::Center)),
                [raw] => Direction::parse(raw).map(Args::Direction).ok_or_else(invalid),
                _ => Err(invalid()),
            },
            ArgGrammar::OptionalTarget => match args.as_slice() {
                [] => Ok(Args::Target(NO_TARGET.to_string())),
                [raw] => Ok(Args::Target(raw.clone())),
                _ => Err(invalid()),
            },
            ArgGrammar::ItemQuantity { allow_all } => {
                let (raw_item, raw_qty) = match args.as_slice() {
                    [item] => (item.clone(), None),
                    [item, qty] => (item.clone(), Some(qty.as_str())),
                    _ => return Err(invalid()),
                };
                let quantity = match raw_qty {
                    None => 1,
                    Some(raw) => match raw.parse::<u32>() {
                        Ok(qty) if qty > 0 => qty,
                        _ => return Err(invalid()),
                    },
                };
                if raw_item.eq_ignore_ascii_case(ALL_ITEMS) {
                    if !allow_all || raw_qty.is_some() {
                        return Err(invalid());
                    }
                    return Ok(Args::ItemQuantity {
                        item: ItemArg::All,
                        quantity,
                    });
                }
                Ok(Args::ItemQuantity {
                    item: ItemArg::Id(raw_item),
                    quantity,
                })
            }
        }
    }
}

/// What a look/sense command applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Here,
    Toward(Direction),
    Item(String),
}

/// Resolve a target: nothing means the current room, then direction
/// aliases (any case), then item ids (exact match).
pub fn resolve_target(raw: &str, catalog: &dyn ItemCatalog) -> AdventureResult<Target> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case(NO_TARGET) {
        return Ok(Target::Here);
    }
    if let Some(direction) = Direction::parse(raw) {
        return Ok(Target::Toward(direction));
    }
    if catalog.item_exists(raw) {
        return Ok(Target::Item(raw.to_string()));
    }
    Err(AdventureError::AmbiguousArgument(raw.to_string()))
}
