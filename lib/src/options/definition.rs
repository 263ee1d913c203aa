use super::value::{Value, ValueKind};

/// Named, typed command-line option registered before parsing
#[derive(Clone, Debug, PartialEq)]
pub struct OptionDefinition {
    pub(crate) name: String,
    pub(crate) short: Option<char>,
    pub(crate) kind: ValueKind,
    pub(crate) default: Option<Value>,
    pub(crate) description: String,
}

impl OptionDefinition {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            short: None,
            kind,
            default: None,
            description: String::new(),
        }
    }

    /// Boolean flag that is false unless given on the command line
    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Bool).with_default(false)
    }

    /// Single-character alias, used as `-x`
    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Value used when the option is not supplied
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Drop the default so the option stays absent unless supplied
    pub fn without_default(mut self) -> Self {
        self.default = None;
        self
    }

    /// Help text
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_alias(&self) -> Option<char> {
        self.short
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Description with the default appended, as shown in the usage screen
    pub(crate) fn help_line(&self) -> String {
        match (&self.default, self.kind) {
            (Some(default), kind) if kind.takes_value() => {
                format!("{} (default: {default})", self.description)
            }
            _ => self.description.clone(),
        }
    }
}

/// Check that a name can be used as a `--long` option
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && !name.chars().any(|c| c == '=' || c.is_whitespace())
}
