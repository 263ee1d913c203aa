use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use lunifylib::{OptionType, ParsedOptions};
use serde::Serialize;

use crate::args;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn rpc_port(self) -> u16 {
        match self {
            Network::Mainnet => lunifylib::MAINNET_RPC_PORT,
            Network::Testnet => lunifylib::TESTNET_RPC_PORT,
        }
    }

    /// Blockchain folder below the user's home directory
    fn default_bc_path(self, home: &Path) -> PathBuf {
        let base = home.join(".lunify");
        match self {
            Network::Mainnet => base.join("lmdb"),
            Network::Testnet => base.join("testnet").join("lmdb"),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

/// Startup configuration handed to the blockchain, mempool and RPC layers.
/// Built once in `main` from the parsed command line.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ExplorerConfig {
    pub network: Network,
    pub bind_addr: String,
    pub port: u16,
    pub bc_path: PathBuf,
    pub daemon_url: String,
    pub fee_grace_blocks: u64,
    pub no_blocks_on_index: u64,
    /// Seconds
    pub mempool_refresh: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl ExplorerConfig {
    /// Resolve network dependent defaults. `home` is only needed when
    /// `--bc-path` was not given.
    pub fn from_options(options: &ParsedOptions, home: Option<&Path>) -> Result<Self> {
        let network = if required::<bool>(options, args::TESTNET)? {
            Network::Testnet
        } else {
            Network::Mainnet
        };

        let port = u16::try_from(required::<u64>(options, args::PORT)?)
            .context("--port must be between 0 and 65535")?;

        let bc_path = match options.get_option::<PathBuf>(args::BC_PATH) {
            Some(path) => path,
            None => network.default_bc_path(
                home.ok_or_else(|| anyhow!("no --bc-path given and HOME is not set"))?,
            ),
        };

        let daemon_url = options
            .get_option::<String>(args::DAEMON_URL)
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", network.rpc_port()));

        Ok(Self {
            network,
            bind_addr: required(options, args::BIND_ADDR)?,
            port,
            bc_path,
            daemon_url,
            fee_grace_blocks: required(options, args::FEE_GRACE_BLOCKS)?,
            no_blocks_on_index: required(options, args::NO_BLOCKS_ON_INDEX)?,
            mempool_refresh: required(options, args::MEMPOOL_REFRESH)?,
            log_dir: options.get_option(args::LOG_DIR),
        })
    }
}

/// Value of an option that carries a default
fn required<T: OptionType>(options: &ParsedOptions, name: &str) -> Result<T> {
    options
        .get_option(name)
        .ok_or_else(|| anyhow!("missing value for --{name}"))
}
