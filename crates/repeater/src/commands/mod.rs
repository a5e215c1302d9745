//! Command dispatch: bridges CLI args -> repeater core -> output formatting.

pub mod config_cmd;
pub mod safe_mode;
pub mod service;
pub mod set;
pub mod show;
pub mod status;

use std::path::PathBuf;
use std::sync::Arc;

use clap::ValueEnum;
use tracing::debug;

use repeater_config::{Config, FileSettings, load_config};
use repeater_core::{CoreError, FileChannel, Notifier, RepeaterManager};

use crate::cli::{ColorMode, Command, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;
use crate::service::{CollectingNotifier, StaticBinder};

pub type Manager = RepeaterManager<StaticBinder, FileChannel>;

/// Everything a command needs from the config file and global flags.
pub struct Context {
    pub path: PathBuf,
    pub config: Config,
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
    pub yes: bool,
}

impl Context {
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let path = config_file(global);
        let config = load_config(&path)?;
        let format = global
            .output
            .or_else(|| OutputFormat::from_str(&config.defaults.output, true).ok())
            .unwrap_or(OutputFormat::Table);
        let color = global
            .color
            .or_else(|| ColorMode::from_str(&config.defaults.color, true).ok())
            .unwrap_or(ColorMode::Auto);
        Ok(Self {
            path,
            config,
            format,
            color: output::should_color(color),
            quiet: global.quiet,
            yes: global.yes,
        })
    }

    pub fn settings(&self) -> Arc<FileSettings> {
        Arc::new(FileSettings::new(&self.path))
    }

    pub fn channel(&self) -> Arc<FileChannel> {
        Arc::new(FileChannel::new(self.config.supplicant.conf_path()))
    }

    /// The repeater service described by `[group]`, if any.
    pub fn binder(&self) -> Option<Arc<StaticBinder>> {
        self.config.group.as_ref().map(|g| Arc::new(StaticBinder::new(g)))
    }

    /// Build a manager and connect it to the configured service.
    pub async fn connect(&self) -> Session {
        let notifier = Arc::new(CollectingNotifier::default());
        let sink: Arc<dyn Notifier> = Arc::<CollectingNotifier>::clone(&notifier);
        let manager = Manager::new(
            self.settings(),
            sink,
            Arc::new(self.config.platform.capabilities()),
            self.channel(),
            Some(&self.config.platform),
        );
        let binder = self.binder();
        if let Some(ref binder) = binder {
            manager.on_service_connected(Arc::clone(binder)).await;
        }
        Session {
            manager,
            binder,
            notifier,
        }
    }

    /// Like `CliError::from`, but points at the config file in use.
    pub fn core_error(&self, err: CoreError) -> CliError {
        match err {
            CoreError::ConfigurationUnavailable => self.unavailable(),
            other => other.into(),
        }
    }

    pub fn unavailable(&self) -> CliError {
        CliError::Unavailable {
            path: self.path.display().to_string(),
        }
    }

    pub fn print(&self, rendered: &str) {
        output::print_output(rendered, self.quiet);
    }
}

/// A manager bound to the configured service for one command.
pub struct Session {
    pub manager: Manager,
    pub binder: Option<Arc<StaticBinder>>,
    pub notifier: Arc<CollectingNotifier>,
}

impl Session {
    pub async fn close(self) {
        self.manager.on_service_disconnected().await;
    }
}

pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(repeater_config::config_path)
}

/// Dispatch a repeater command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = Context::load(global)?;
    debug!(config = %ctx.path.display(), "loaded configuration");
    match cmd {
        Command::Show(args) => show::handle(&ctx, &args).await,
        Command::Set(args) => set::handle(&ctx, args).await,
        Command::Status => status::handle(&ctx).await,
        Command::Toggle => service::toggle(&ctx).await,
        Command::Wps(args) => service::wps(&ctx, args).await,
        Command::SafeMode(args) => safe_mode::handle(&ctx, &args),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
