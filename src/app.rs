use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::hooks::SettingsHookRegistry;
use crate::soundpack::SoundPackManager;

pub struct AppContext {
    pub config_path: Option<PathBuf>,
    pub config: Config,
    pub robot_mode: bool,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        let config_path = match &cli.config {
            Some(path) => Some(path.clone()),
            None => Config::global_path().ok().filter(|path| path.exists()),
        };

        Ok(Self {
            config_path,
            config,
            robot_mode: cli.robot,
            verbosity: cli.verbose,
        })
    }

    /// Lifecycle controller over the configured repository and hosts.
    pub fn manager(&self) -> Result<SoundPackManager> {
        self.config.manager()
    }

    #[must_use]
    pub fn registry(&self) -> SettingsHookRegistry {
        self.config.registry()
    }
}
