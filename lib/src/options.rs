mod config_file;
mod definition;
mod parsed;
mod value;

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::parser::ValueSource;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing::debug;

use crate::error::{OptionsError, Result};

pub use definition::OptionDefinition;
pub use parsed::{ParsedOptions, ValueOrigin};
pub use value::{OptionType, Value, ValueKind};

/// Set of recognized command-line options.
///
/// Tokenizing is left to clap; the registry owns the typed definitions and
/// turns clap's matches into a [`ParsedOptions`].
///
/// When an option is given more than once the last occurrence wins.
#[derive(Clone, Debug)]
pub struct OptionsRegistry {
    program: String,
    about: Option<String>,
    definitions: Vec<OptionDefinition>,
}

impl OptionsRegistry {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            about: None,
            definitions: vec![],
        }
    }

    /// One-line description shown at the top of the usage screen
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Register an option. Names and short aliases must be unique.
    pub fn define(&mut self, definition: OptionDefinition) -> Result<&mut Self> {
        if !definition::is_valid_name(&definition.name) {
            return Err(OptionsError::InvalidName(definition.name));
        }
        if self.definition(&definition.name).is_some() {
            return Err(OptionsError::DuplicateOption(definition.name));
        }
        if let Some(alias) = definition.short {
            if !alias.is_ascii_alphanumeric() {
                return Err(OptionsError::InvalidAlias {
                    option: definition.name,
                    alias,
                });
            }
            if self.definitions.iter().any(|d| d.short == Some(alias)) {
                return Err(OptionsError::DuplicateAlias(alias));
            }
        }
        if let Some(default) = &definition.default {
            if default.kind() != definition.kind {
                return Err(OptionsError::DefaultKindMismatch {
                    found: default.kind(),
                    declared: definition.kind,
                    option: definition.name,
                });
            }
        }

        self.definitions.push(definition);
        Ok(self)
    }

    pub fn definition(&self, name: &str) -> Option<&OptionDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Definitions in registration order
    pub fn definitions(&self) -> &[OptionDefinition] {
        &self.definitions
    }

    /// Parse a full argument vector, program name first (as returned by
    /// `std::env::args_os`)
    pub fn parse<I, T>(&self, args: I) -> Result<ParsedOptions>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut parsed = self.parse_command_line(args)?;
        self.apply_defaults(&mut parsed);
        Ok(parsed)
    }

    /// Like [`parse`](Self::parse), but options missing from the command
    /// line are first looked up in the TOML file named by the Path option
    /// `path_option`. Command line beats file, file beats defaults.
    pub fn parse_with_config_file<I, T>(
        &self,
        args: I,
        path_option: &str,
    ) -> Result<ParsedOptions>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let definition = self
            .definition(path_option)
            .ok_or_else(|| OptionsError::NotDefined(path_option.to_string()))?;
        if definition.kind != ValueKind::Path {
            return Err(OptionsError::TypeMismatch {
                option: path_option.to_string(),
                declared: definition.kind,
                requested: ValueKind::Path,
            });
        }

        let mut parsed = self.parse_command_line(args)?;

        let config_path = match parsed.value(path_option) {
            Some(Value::Path(path)) => Some(path.clone()),
            _ => match &definition.default {
                Some(Value::Path(path)) => Some(path.clone()),
                _ => None,
            },
        };
        if let Some(path) = config_path {
            config_file::apply(self, &mut parsed, &path)?;
        }

        self.apply_defaults(&mut parsed);
        Ok(parsed)
    }

    /// Write every defaulted option into a TOML file that
    /// [`parse_with_config_file`](Self::parse_with_config_file) accepts
    pub fn generate_config_template(&self, path: &Path) -> Result<()> {
        config_file::write_template(self, path)
    }

    /// Rendered help screen
    pub fn usage(&self) -> String {
        self.command().render_help().to_string()
    }

    fn parse_command_line<I, T>(&self, args: I) -> Result<ParsedOptions>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self
            .command()
            .try_get_matches_from(args)
            .map_err(|e| self.convert_error(e))?;

        let mut parsed = ParsedOptions::new(self.declared_kinds());
        for definition in &self.definitions {
            if matches.value_source(&definition.name) != Some(ValueSource::CommandLine) {
                continue;
            }
            if let Some(value) = extract(&matches, definition)? {
                debug!(option = %definition.name, %value, "option set on command line");
                parsed.fill(&definition.name, value, ValueOrigin::CommandLine);
            }
        }

        Ok(parsed)
    }

    fn apply_defaults(&self, parsed: &mut ParsedOptions) {
        for definition in &self.definitions {
            if let Some(default) = &definition.default {
                parsed.fill(&definition.name, default.clone(), ValueOrigin::Default);
            }
        }
    }

    fn declared_kinds(&self) -> HashMap<String, ValueKind> {
        self.definitions
            .iter()
            .map(|d| (d.name.clone(), d.kind))
            .collect()
    }

    fn command(&self) -> Command {
        let mut command = Command::new(self.program.clone())
            .disable_help_flag(true)
            .disable_version_flag(true)
            .args_override_self(true);
        if let Some(about) = &self.about {
            command = command.about(about.clone());
        }

        self.definitions
            .iter()
            .fold(command, |command, definition| command.arg(to_arg(definition)))
    }

    /// Map clap's error onto our taxonomy, naming the option where possible
    fn convert_error(&self, err: clap::Error) -> OptionsError {
        let context = |kind| match err.get(kind) {
            Some(ContextValue::String(s)) => Some(s.clone()),
            _ => None,
        };
        let invalid_arg = context(ContextKind::InvalidArg);
        let invalid_value = context(ContextKind::InvalidValue);

        match err.kind() {
            ErrorKind::UnknownArgument => {
                OptionsError::UnknownOption(invalid_arg.unwrap_or_else(|| clap_message(&err)))
            }
            ErrorKind::ValueValidation | ErrorKind::InvalidValue => {
                let option = invalid_arg
                    .map(|arg| self.option_name(&arg))
                    .unwrap_or_default();
                match invalid_value {
                    Some(value) if !value.is_empty() => {
                        let reason = match std::error::Error::source(&err) {
                            Some(source) => source.to_string(),
                            None => match self.definition(&option) {
                                Some(d) => format!("expected {}", d.kind()),
                                None => "invalid value".to_string(),
                            },
                        };
                        OptionsError::MalformedValue {
                            option,
                            value,
                            reason,
                        }
                    }
                    _ => OptionsError::MissingValue(option),
                }
            }
            _ => OptionsError::Usage(clap_message(&err)),
        }
    }

    /// Turn clap's rendering of an argument ("--port <PORT>", "-p") back
    /// into the registered name
    fn option_name(&self, rendered: &str) -> String {
        let flag = rendered.split_whitespace().next().unwrap_or(rendered);
        let bare = flag.trim_start_matches('-');
        let mut chars = bare.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(definition) = self.definitions.iter().find(|d| d.short == Some(c)) {
                return definition.name.clone();
            }
        }
        bare.to_string()
    }
}

/// First paragraph of clap's rendered error, without the "error: " prefix
/// and the usage/help hints it appends
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let message = rendered.split("\n\n").next().unwrap_or(&rendered).trim();
    message
        .strip_prefix("error:")
        .unwrap_or(message)
        .trim()
        .to_string()
}

fn to_arg(definition: &OptionDefinition) -> Arg {
    let name = definition.name();
    let mut arg = Arg::new(name.to_string())
        .long(name.to_string())
        .help(definition.help_line());
    if let Some(short) = definition.short_alias() {
        arg = arg.short(short);
    }

    let arg = match definition.kind() {
        ValueKind::Bool => return arg.action(ArgAction::SetTrue),
        ValueKind::Str => arg.value_parser(value_parser!(String)),
        ValueKind::Int => arg
            .value_parser(value_parser!(i64))
            .allow_negative_numbers(true),
        // `-1` is a malformed value here, not a short flag
        ValueKind::UInt => arg
            .value_parser(value_parser!(u64))
            .allow_negative_numbers(true),
        ValueKind::Float => arg
            .value_parser(value_parser!(f64))
            .allow_negative_numbers(true),
        ValueKind::Path => arg.value_parser(value_parser!(PathBuf)),
    };

    arg.action(ArgAction::Set)
        .num_args(1)
        .value_name(name.to_uppercase().replace('-', "_"))
}

fn extract(matches: &ArgMatches, definition: &OptionDefinition) -> Result<Option<Value>> {
    let id = definition.name();
    let value = match definition.kind() {
        ValueKind::Bool => matches
            .try_get_one::<bool>(id)
            .map(|v| v.copied().map(Value::Bool)),
        ValueKind::Str => matches
            .try_get_one::<String>(id)
            .map(|v| v.cloned().map(Value::Str)),
        ValueKind::Int => matches
            .try_get_one::<i64>(id)
            .map(|v| v.copied().map(Value::Int)),
        ValueKind::UInt => matches
            .try_get_one::<u64>(id)
            .map(|v| v.copied().map(Value::UInt)),
        ValueKind::Float => matches
            .try_get_one::<f64>(id)
            .map(|v| v.copied().map(Value::Float)),
        ValueKind::Path => matches
            .try_get_one::<PathBuf>(id)
            .map(|v| v.cloned().map(Value::Path)),
    };

    value.map_err(|e| OptionsError::Usage(format!("read option '{id}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> OptionsRegistry {
        let mut registry = OptionsRegistry::new("explorer").about("test registry");
        registry
            .define(
                OptionDefinition::new("port", ValueKind::Int)
                    .short('p')
                    .with_default(18080i64)
                    .describe("port number"),
            )
            .unwrap()
            .define(
                OptionDefinition::flag("testnet")
                    .short('t')
                    .describe("use testnet"),
            )
            .unwrap()
            .define(OptionDefinition::new("bc-path", ValueKind::Path).short('b'))
            .unwrap()
            .define(OptionDefinition::new("daemon-url", ValueKind::Str))
            .unwrap()
            .define(OptionDefinition::new("fee-grace-blocks", ValueKind::UInt).with_default(10u64))
            .unwrap()
            .define(OptionDefinition::new("ratio", ValueKind::Float))
            .unwrap()
            .define(OptionDefinition::flag("verbose").without_default())
            .unwrap()
            .define(OptionDefinition::new("config-file", ValueKind::Path))
            .unwrap();
        registry
    }

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("explorer")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn port_and_testnet_supplied() {
        let parsed = registry()
            .parse(argv(&["--port", "28080", "--testnet"]))
            .unwrap();

        assert_eq!(parsed.get_option::<i64>("port"), Some(28080));
        assert_eq!(parsed.get_option::<bool>("testnet"), Some(true));
        assert_eq!(parsed.origin("port"), Some(ValueOrigin::CommandLine));
    }

    #[test]
    fn empty_command_line_yields_defaults() {
        let parsed = registry().parse(argv(&[])).unwrap();

        assert_eq!(parsed.get_option::<i64>("port"), Some(18080));
        assert_eq!(parsed.get_option::<bool>("testnet"), Some(false));
        assert_eq!(parsed.get_option::<u64>("fee-grace-blocks"), Some(10));
        assert_eq!(parsed.origin("port"), Some(ValueOrigin::Default));
    }

    #[test]
    fn options_without_default_stay_absent() {
        let parsed = registry().parse(argv(&[])).unwrap();

        assert_eq!(parsed.get_option::<PathBuf>("bc-path"), None);
        assert_eq!(parsed.get_option::<String>("daemon-url"), None);
        assert_eq!(parsed.get_option::<f64>("ratio"), None);
        assert_eq!(parsed.get_option::<bool>("verbose"), None);
        assert!(!parsed.is_present("verbose"));
    }

    #[test]
    fn flag_without_default_is_true_when_given() {
        let parsed = registry().parse(argv(&["--verbose"])).unwrap();
        assert_eq!(parsed.get_option::<bool>("verbose"), Some(true));
    }

    #[test]
    fn equals_and_separate_forms_match() {
        let registry = registry();
        let joined = registry
            .parse(argv(&["--port=28080", "--daemon-url=http://node:18081"]))
            .unwrap();
        let separate = registry
            .parse(argv(&["--port", "28080", "--daemon-url", "http://node:18081"]))
            .unwrap();

        assert_eq!(joined, separate);
    }

    #[test]
    fn lookup_is_repeatable() {
        let parsed = registry().parse(argv(&["--bc-path", "/tmp/lmdb"])).unwrap();

        let first = parsed.get_option::<PathBuf>("bc-path");
        let second = parsed.get_option::<PathBuf>("bc-path");
        assert_eq!(first, second);
        assert_eq!(first, Some(PathBuf::from("/tmp/lmdb")));
    }

    #[test]
    fn unknown_option_fails() {
        let err = registry().parse(argv(&["--bogus", "1"])).unwrap_err();
        assert!(matches!(err, OptionsError::UnknownOption(_)), "{err:?}");
    }

    #[test]
    fn stray_positional_fails() {
        let err = registry().parse(argv(&["lmdb"])).unwrap_err();
        assert!(matches!(err, OptionsError::UnknownOption(_)), "{err:?}");
    }

    #[test]
    fn non_numeric_integer_fails() {
        let err = registry().parse(argv(&["--port", "abc"])).unwrap_err();
        match err {
            OptionsError::MalformedValue { option, value, .. } => {
                assert_eq!(option, "port");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn negative_unsigned_fails() {
        let registry = registry();
        for args in [&["--fee-grace-blocks=-1"][..], &["--fee-grace-blocks", "-1"]] {
            let err = registry.parse(argv(args)).unwrap_err();
            assert!(
                matches!(
                    &err,
                    OptionsError::MalformedValue { option, value, .. }
                        if option == "fee-grace-blocks" && value == "-1"
                ),
                "{args:?}: {err:?}"
            );
        }
    }

    #[test]
    fn missing_value_fails() {
        let err = registry().parse(argv(&["--port"])).unwrap_err();
        assert!(
            matches!(&err, OptionsError::MissingValue(name) if name == "port"),
            "{err:?}"
        );
    }

    #[test]
    fn usage_error_is_a_single_line() {
        let err = registry().parse(argv(&["--testnet=true"])).unwrap_err();
        match err {
            OptionsError::Usage(message) => {
                assert!(message.contains("testnet"), "{message}");
                assert!(!message.starts_with("error:"), "{message}");
                assert!(!message.contains("Usage:"), "{message}");
                assert!(!message.contains('\n'), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn last_occurrence_wins() {
        let parsed = registry()
            .parse(argv(&["--port", "1", "-p", "2", "--testnet", "-t"]))
            .unwrap();

        assert_eq!(parsed.get_option::<i64>("port"), Some(2));
        assert_eq!(parsed.get_option::<bool>("testnet"), Some(true));
    }

    #[test]
    fn short_aliases() {
        let parsed = registry().parse(argv(&["-p28080", "-t", "-b", "/data"])).unwrap();

        assert_eq!(parsed.get_option::<i64>("port"), Some(28080));
        assert_eq!(parsed.get_option::<bool>("testnet"), Some(true));
        assert_eq!(parsed.get_option::<PathBuf>("bc-path"), Some(PathBuf::from("/data")));
    }

    #[test]
    fn negative_numbers_are_values() {
        let parsed = registry()
            .parse(argv(&["--port", "-5", "--ratio", "-0.5"]))
            .unwrap();

        assert_eq!(parsed.get_option::<i64>("port"), Some(-5));
        assert_eq!(parsed.get_option::<f64>("ratio"), Some(-0.5));
    }

    #[test]
    #[should_panic(expected = "declared as int")]
    fn wrong_type_panics() {
        let parsed = registry().parse(argv(&[])).unwrap();
        parsed.get_option::<String>("port");
    }

    #[test]
    #[should_panic(expected = "declared as path")]
    fn wrong_type_panics_even_when_absent() {
        let parsed = registry().parse(argv(&[])).unwrap();
        parsed.get_option::<String>("bc-path");
    }

    #[test]
    #[should_panic(expected = "not defined")]
    fn undefined_name_panics() {
        let parsed = registry().parse(argv(&[])).unwrap();
        parsed.get_option::<bool>("nope");
    }

    #[test]
    fn try_get_reports_caller_errors() {
        let parsed = registry().parse(argv(&[])).unwrap();

        assert!(matches!(
            parsed.try_get_option::<u64>("port"),
            Err(OptionsError::TypeMismatch {
                declared: ValueKind::Int,
                requested: ValueKind::UInt,
                ..
            })
        ));
        assert!(matches!(
            parsed.try_get_option::<u64>("nope"),
            Err(OptionsError::NotDefined(_))
        ));
        assert_eq!(parsed.try_get_option::<i64>("port").unwrap(), Some(18080));
    }

    #[test]
    fn duplicate_definitions_rejected() {
        let mut registry = registry();

        let err = registry
            .define(OptionDefinition::new("port", ValueKind::UInt))
            .unwrap_err();
        assert!(matches!(err, OptionsError::DuplicateOption(name) if name == "port"));

        let err = registry
            .define(OptionDefinition::new("peer", ValueKind::Str).short('p'))
            .unwrap_err();
        assert!(matches!(err, OptionsError::DuplicateAlias('p')));
    }

    #[test]
    fn malformed_definitions_rejected() {
        let mut registry = OptionsRegistry::new("explorer");

        for name in ["", "--port", "a=b", "two words"] {
            let err = registry
                .define(OptionDefinition::new(name, ValueKind::Str))
                .unwrap_err();
            assert!(matches!(err, OptionsError::InvalidName(_)), "{name:?}");
        }

        let err = registry
            .define(OptionDefinition::new("port", ValueKind::Int).with_default("8081"))
            .unwrap_err();
        assert!(matches!(err, OptionsError::DefaultKindMismatch { .. }));

        let err = registry
            .define(OptionDefinition::flag("quiet").short('-'))
            .unwrap_err();
        assert!(matches!(err, OptionsError::InvalidAlias { .. }));

        assert!(registry.definitions().is_empty());
        assert!(registry.parse(argv(&[])).unwrap().is_empty());
    }

    #[test]
    fn usage_lists_options_and_defaults() {
        let usage = registry().usage();

        assert!(usage.contains("--port"));
        assert!(usage.contains("-t"));
        assert!(usage.contains("(default: 18080)"));
        assert!(usage.contains("use testnet"));
    }

    #[test]
    fn iter_is_sorted_by_name() {
        let parsed = registry().parse(argv(&["--testnet"])).unwrap();
        let names = parsed.iter().map(|(name, _, _)| name).collect::<Vec<_>>();

        assert_eq!(names, vec!["fee-grace-blocks", "port", "testnet"]);
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn parsed_options_can_be_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ParsedOptions>();

        let parsed = std::sync::Arc::new(registry().parse(argv(&["-p", "1"])).unwrap());
        let handles = (0..4)
            .map(|_| {
                let parsed = std::sync::Arc::clone(&parsed);
                std::thread::spawn(move || parsed.get_option::<i64>("port"))
            })
            .collect::<Vec<_>>();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(1));
        }
    }

    #[test]
    fn config_file_fills_missing_options() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("explorer.toml");
        std::fs::write(
            &path,
            "port = 30000\ntestnet = true\ndaemon-url = \"http://10.0.0.1:18081\"\nratio = 2\n",
        )
        .unwrap();

        let parsed = registry()
            .parse_with_config_file(
                argv(&["--port", "28080", "--config-file", path.to_str().unwrap()]),
                "config-file",
            )
            .unwrap();

        assert_eq!(parsed.get_option::<i64>("port"), Some(28080));
        assert_eq!(parsed.origin("port"), Some(ValueOrigin::CommandLine));
        assert_eq!(parsed.get_option::<bool>("testnet"), Some(true));
        assert_eq!(parsed.origin("testnet"), Some(ValueOrigin::ConfigFile));
        assert_eq!(
            parsed.get_option::<String>("daemon-url").as_deref(),
            Some("http://10.0.0.1:18081")
        );
        assert_eq!(parsed.get_option::<f64>("ratio"), Some(2.0));
        assert_eq!(parsed.get_option::<u64>("fee-grace-blocks"), Some(10));
        assert_eq!(parsed.origin("fee-grace-blocks"), Some(ValueOrigin::Default));
    }

    #[test]
    fn config_file_is_optional() {
        let parsed = registry()
            .parse_with_config_file(argv(&["-t"]), "config-file")
            .unwrap();
        assert_eq!(parsed, registry().parse(argv(&["-t"])).unwrap());
    }

    #[test]
    fn config_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry();
        let parse = |contents: &str| {
            let path = dir.path().join("bad.toml");
            std::fs::write(&path, contents).unwrap();
            registry.parse_with_config_file(
                argv(&["--config-file", path.to_str().unwrap()]),
                "config-file",
            )
        };

        assert!(matches!(
            parse("bogus = 1"),
            Err(OptionsError::UnknownOption(name)) if name == "bogus"
        ));
        assert!(matches!(
            parse("port = \"abc\""),
            Err(OptionsError::MalformedValue { option, .. }) if option == "port"
        ));
        assert!(matches!(
            parse("fee-grace-blocks = -3"),
            Err(OptionsError::MalformedValue { .. })
        ));
        assert!(matches!(
            parse("ratio = 9007199254740993"),
            Err(OptionsError::MalformedValue { option, .. }) if option == "ratio"
        ));
        assert!(matches!(
            parse("port = "),
            Err(OptionsError::ConfigFile { .. })
        ));

        let missing = registry.parse_with_config_file(
            argv(&["--config-file", "/nonexistent/explorer.toml"]),
            "config-file",
        );
        assert!(matches!(missing, Err(OptionsError::ConfigFile { .. })));

        assert!(matches!(
            registry.parse_with_config_file(argv(&[]), "port"),
            Err(OptionsError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn generated_template_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.toml");
        let registry = registry();

        registry.generate_config_template(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("port = 18080"), "{contents}");

        let parsed = registry
            .parse_with_config_file(
                argv(&["--config-file", path.to_str().unwrap()]),
                "config-file",
            )
            .unwrap();
        assert_eq!(parsed.get_option::<i64>("port"), Some(18080));
        assert_eq!(parsed.origin("port"), Some(ValueOrigin::ConfigFile));
    }
}
