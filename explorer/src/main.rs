mod args;
mod config;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use config::ExplorerConfig;
use tracing::{debug, info, warn};

fn main() -> Result<()> {
    let registry = args::registry().context("define command-line options")?;

    let options = match args::parse(&registry, std::env::args_os()) {
        Ok(options) => options,
        Err(e) => {
            eprint!("{}", args::error_report(&registry, &e));
            std::process::exit(1);
        }
    };

    if options.get_option::<bool>(args::HELP) == Some(true) {
        println!("{}", registry.usage());
        return Ok(());
    }

    if let Some(path) = options.get_option::<PathBuf>(args::GENERATE_CONFIG) {
        registry
            .generate_config_template(&path)
            .context("generate config template")?;
        println!("Config template generated at: {}", path.display());
        return Ok(());
    }

    logging::setup_tracing(options.get_option::<PathBuf>(args::LOG_DIR).as_deref())
        .context("set up logging")?;
    logging::setup_panic_hook();

    for (name, value, origin) in options.iter() {
        debug!(option = name, %value, %origin, "startup option");
    }

    let home = std::env::var_os("HOME").map(PathBuf::from);
    let config = ExplorerConfig::from_options(&options, home.as_deref())
        .context("resolve startup configuration")?;

    info!(
        network = %config.network,
        daemon = %config.daemon_url,
        "explorer configured to listen on {}:{}",
        config.bind_addr,
        config.port
    );
    if !config.bc_path.exists() {
        warn!(path = %config.bc_path.display(), "blockchain folder does not exist");
    }

    let rendered = toml::to_string_pretty(&config).context("serialize configuration")?;
    println!("{rendered}");

    Ok(())
}
