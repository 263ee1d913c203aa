use std::path::PathBuf;

use thiserror::Error;

use crate::options::ValueKind;

pub type Result<T> = std::result::Result<T, OptionsError>;

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("Option '{0}' is defined more than once")]
    DuplicateOption(String),
    #[error("Short alias '-{0}' is used by more than one option")]
    DuplicateAlias(char),
    #[error("Invalid option name: '{0}'")]
    InvalidName(String),
    #[error("Invalid short alias '{alias}' for option '{option}'")]
    InvalidAlias { option: String, alias: char },
    #[error("Default of option '{option}' is {found}, expected {declared}")]
    DefaultKindMismatch {
        option: String,
        declared: ValueKind,
        found: ValueKind,
    },
    #[error("Unrecognized option: '{0}'")]
    UnknownOption(String),
    #[error("Invalid value '{value}' for option '{option}': {reason}")]
    MalformedValue {
        option: String,
        value: String,
        reason: String,
    },
    #[error("Option '{0}' requires a value")]
    MissingValue(String),
    #[error("Invalid command line: {0}")]
    Usage(String),
    #[error("Option '{option}' is declared as {declared}, requested as {requested}")]
    TypeMismatch {
        option: String,
        declared: ValueKind,
        requested: ValueKind,
    },
    #[error("Option '{0}' is not defined")]
    NotDefined(String),
    #[error("Config file '{}': {reason}", path.display())]
    ConfigFile { path: PathBuf, reason: String },
}
