use ipguard_domain::{CliOverrides, Config};

/// Runs before logging is initialised; failures surface through `main`'s error.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides).map_err(|e| anyhow::anyhow!(e))?;

    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    Ok(config)
}
