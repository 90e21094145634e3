use anyhow::{Context as _, Result};
use anyl_core::config::Config;
use anyl_core::env::{get_base_dir, log_dir};
use anyl_core::models::GameId;
use anyl_core::{ConfigManager, GameRegistry, LaunchSequencer, RegistryStore};
use anyl_core::process::SystemStarter;
use std::path::PathBuf;

/// Everything a command needs: where data lives, the loaded configuration,
/// and the running logger.
pub struct Context {
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
    _logger: flexi_logger::LoggerHandle,
}

impl Context {
    pub fn new() -> Result<Self> {
        let base_dir = get_base_dir()?;
        std::fs::create_dir_all(&base_dir)
            .with_context(|| format!("cannot create {}", base_dir.display()))?;

        let log_dir = log_dir(&base_dir);
        std::fs::create_dir_all(&log_dir)?;
        let logger = flexi_logger::Logger::try_with_env_or_str("info")?
            .log_to_file(
                flexi_logger::FileSpec::default()
                    .directory(&log_dir)
                    .basename("anyl")
                    .suffix("log")
                    .suppress_timestamp(),
            )
            .append()
            .duplicate_to_stderr(flexi_logger::Duplicate::Warn)
            .format(flexi_logger::opt_format)
            .start()?;
        log::debug!("anyl v{} using {}", env!("CARGO_PKG_VERSION"), base_dir.display());

        let manager = ConfigManager::new(&base_dir)?;
        Ok(Self {
            base_dir,
            config_path: manager.path().to_path_buf(),
            config: manager.config,
            _logger: logger,
        })
    }

    pub fn store(&self) -> RegistryStore {
        RegistryStore::new(&self.base_dir).with_lock_options(self.config.lock_options())
    }

    pub fn registry(&self) -> Result<GameRegistry> {
        Ok(GameRegistry::open(self.store())?)
    }

    pub fn sequencer(&self) -> LaunchSequencer<SystemStarter> {
        LaunchSequencer::new(SystemStarter::new().with_html_opener(self.config.html_opener.clone()))
    }
}

/// Accepts a full id or any unambiguous prefix of one, as shown by `anyl list`.
/// Unknown input is passed through so the registry reports it as not found.
pub fn resolve_id(registry: &GameRegistry, input: &str) -> Result<GameId> {
    let exact = GameId::from(input);
    if registry.get(&exact).is_some() {
        return Ok(exact);
    }
    let matches: Vec<GameId> = registry
        .list()
        .into_iter()
        .map(|e| e.id)
        .filter(|id| id.as_str().starts_with(input))
        .collect();
    match matches.as_slice() {
        [one] => Ok(one.clone()),
        [] => Ok(exact),
        _ => anyhow::bail!("id prefix '{}' matches {} games", input, matches.len()),
    }
}
