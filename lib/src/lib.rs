pub mod error;
pub mod options;

pub use error::{OptionsError, Result};
pub use options::{
    OptionDefinition, OptionType, OptionsRegistry, ParsedOptions, Value, ValueKind, ValueOrigin,
};

/// A fee estimate stays valid for this many blocks
pub const FEE_ESTIMATE_GRACE_BLOCKS: u64 = 10;
/// Daemon RPC port on mainnet
pub const MAINNET_RPC_PORT: u16 = 18081;
/// Daemon RPC port on testnet
pub const TESTNET_RPC_PORT: u16 = 28081;
