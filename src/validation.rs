//! Identifier validation for description files and saved game instances.
//!
//! Every id that becomes part of a filesystem path (world, region, zone,
//! room and item ids, story and instance names) goes through here first.

/// Identifier validation errors with helpful messages
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("identifier contains path separators (/ or \\) or '..'")]
    PathTraversal,

    #[error("identifier contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },

    #[error("identifier is a reserved filesystem name")]
    Reserved,
}

/// Identifier validation rules configuration
#[derive(Debug, Clone)]
pub struct IdentifierRules {
    pub max_length: usize,
    /// Dots are fine in file names but would split a saved position path.
    pub allow_dots: bool,
}

impl IdentifierRules {
    /// Rules for ids that appear in a dotted position path or a file name
    pub fn description() -> Self {
        IdentifierRules {
            max_length: 64,
            allow_dots: false,
        }
    }

    /// Rules for user-chosen saved instance names
    pub fn instance() -> Self {
        IdentifierRules {
            max_length: 40,
            allow_dots: true,
        }
    }
}

fn is_reserved(lower: &str) -> bool {
    matches!(
        lower,
        "." | ".."
            | "con"
            | "prn"
            | "aux"
            | "nul"
            | "com1"
            | "com2"
            | "com3"
            | "com4"
            | "lpt1"
            | "lpt2"
            | "lpt3"
            | "lpt4"
    )
}

/// Validate an identifier according to the given rules
pub fn validate_identifier<'a>(
    id: &'a str,
    rules: &IdentifierRules,
) -> Result<&'a str, IdentifierError> {
    if id.is_empty() {
        return Err(IdentifierError::Empty);
    }
    if id.chars().count() > rules.max_length {
        return Err(IdentifierError::TooLong {
            max: rules.max_length,
        });
    }
    if id.contains("..") || id.contains('/') || id.contains('\\') {
        return Err(IdentifierError::PathTraversal);
    }
    if is_reserved(&id.to_lowercase()) {
        return Err(IdentifierError::Reserved);
    }

    let invalid: String = id
        .chars()
        .filter(|&c| {
            let ok = c.is_ascii_alphanumeric() || c == '_' || c == '-' || (c == '.' && rules.allow_dots);
            !ok
        })
        .collect();
    if !invalid.is_empty() {
        return Err(IdentifierError::InvalidCharacters { chars: invalid });
    }

    Ok(id)
}

/// Validate a world/region/zone/room/item id
pub fn validate_description_id(id: &str) -> Result<&str, IdentifierError> {
    validate_identifier(id, &IdentifierRules::description())
}

/// Validate a saved instance or story directory name
pub fn validate_instance_name(name: &str) -> Result<&str, IdentifierError> {
    validate_identifier(name, &IdentifierRules::instance())
}
