use std::ffi::OsString;

use lunifylib::{OptionDefinition, OptionsError, OptionsRegistry, ParsedOptions, ValueKind};

pub const HELP: &str = "help";
pub const TESTNET: &str = "testnet";
pub const PORT: &str = "port";
pub const BIND_ADDR: &str = "bind-addr";
pub const BC_PATH: &str = "bc-path";
pub const DAEMON_URL: &str = "daemon-url";
pub const FEE_GRACE_BLOCKS: &str = "fee-grace-blocks";
pub const NO_BLOCKS_ON_INDEX: &str = "no-blocks-on-index";
pub const MEMPOOL_REFRESH: &str = "mempool-refresh";
pub const CONFIG_FILE: &str = "config-file";
pub const GENERATE_CONFIG: &str = "generate-config";
pub const LOG_DIR: &str = "log-dir";

/// Command-line surface of the explorer
pub fn registry() -> lunifylib::Result<OptionsRegistry> {
    let mut registry = OptionsRegistry::new("explorer").about("Lunify blockchain explorer");
    registry
        .define(OptionDefinition::flag(HELP).short('h').describe("produce help message"))?
        .define(
            OptionDefinition::flag(TESTNET)
                .short('t')
                .describe("use testnet blockchain"),
        )?
        .define(
            OptionDefinition::new(PORT, ValueKind::UInt)
                .short('p')
                .with_default(8081u64)
                .describe("explorer port"),
        )?
        .define(
            OptionDefinition::new(BIND_ADDR, ValueKind::Str)
                .short('a')
                .with_default("0.0.0.0")
                .describe("address the explorer listens on"),
        )?
        .define(
            OptionDefinition::new(BC_PATH, ValueKind::Path)
                .short('b')
                .describe("path to lmdb folder of the blockchain, e.g., ~/.lunify/lmdb"),
        )?
        .define(
            OptionDefinition::new(DAEMON_URL, ValueKind::Str)
                .short('d')
                .describe("daemon RPC url (default: http://127.0.0.1:18081, 28081 on testnet)"),
        )?
        .define(
            OptionDefinition::new(FEE_GRACE_BLOCKS, ValueKind::UInt)
                .with_default(lunifylib::FEE_ESTIMATE_GRACE_BLOCKS)
                .describe("number of blocks a fee estimate stays valid"),
        )?
        .define(
            OptionDefinition::new(NO_BLOCKS_ON_INDEX, ValueKind::UInt)
                .with_default(10u64)
                .describe("number of last blocks to be shown on index page"),
        )?
        .define(
            OptionDefinition::new(MEMPOOL_REFRESH, ValueKind::UInt)
                .with_default(5u64)
                .describe("mempool refresh interval in seconds"),
        )?
        .define(
            OptionDefinition::new(CONFIG_FILE, ValueKind::Path)
                .short('c')
                .describe("TOML file with option values; the command line takes precedence"),
        )?
        .define(
            OptionDefinition::new(GENERATE_CONFIG, ValueKind::Path)
                .describe("write a config file template to this path and exit"),
        )?
        .define(
            OptionDefinition::new(LOG_DIR, ValueKind::Path)
                .describe("also write daily rotated logs into this folder"),
        )?;

    Ok(registry)
}

/// Parse the command line, reading `--config-file` if one was given
pub fn parse<I, T>(registry: &OptionsRegistry, args: I) -> lunifylib::Result<ParsedOptions>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    registry.parse_with_config_file(args, CONFIG_FILE)
}

/// What gets printed to stderr when the command line is rejected
pub fn error_report(registry: &OptionsRegistry, err: &OptionsError) -> String {
    format!("error: {err}\n\n{}\n", registry.usage().trim_end())
}
