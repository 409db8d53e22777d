//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use zepwatch_core::warmup::DEFAULT_WARMUP_MS;
use zepwatch_dispatch::command::DEFAULT_NOTIFY_COMMAND;
use zepwatch_dispatch::focus::DEFAULT_TAB_URL_PREFIX;

pub const DEFAULT_ICON: &str = "icon128.png";

#[derive(Parser)]
#[command(name = "zepwatch", about = "chat message notifier", version)]
pub struct Cli {
    /// Store file (default: <config dir>/zepwatch/storage.json)
    #[arg(long, global = true, env = "ZEPWATCH_STORE")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Read the render feed on stdin and emit notifications
    Run(RunOpts),
    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Show or forget the learned nickname
    #[command(subcommand)]
    Identity(IdentityCommand),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SinkKind {
    /// Send `notification` messages back to the host on stdout
    #[default]
    Host,
    /// Run a desktop notifier command
    Command,
}

#[derive(clap::Args)]
pub struct RunOpts {
    /// Where notifications are shown
    #[arg(long, value_enum, default_value_t = SinkKind::Host)]
    pub sink: SinkKind,

    /// Notifier program for `--sink command`
    #[arg(long, default_value = DEFAULT_NOTIFY_COMMAND)]
    pub notify_command: String,

    /// Icon passed with every notification
    #[arg(long, default_value = DEFAULT_ICON)]
    pub icon: String,

    /// Tabs whose URL starts with this are refocused on notification click
    #[arg(long, default_value = DEFAULT_TAB_URL_PREFIX)]
    pub tab_url_prefix: String,

    /// Startup window during which nothing notifies
    #[arg(long, default_value_t = DEFAULT_WARMUP_MS)]
    pub warmup_ms: u64,

    /// How often the store file is checked for outside edits
    #[arg(long, default_value = "1000")]
    pub store_poll_ms: u64,

    /// Keep identity and settings in memory only
    #[arg(long)]
    pub ephemeral: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print effective settings (JSON)
    Show,
    /// Change one or more settings
    Set(SetOpts),
}

#[derive(clap::Args)]
pub struct SetOpts {
    /// Minimum spacing between notifications, 0 disables
    #[arg(long)]
    pub cooldown_ms: Option<u64>,

    /// Notify only while the private tab is active
    #[arg(long)]
    pub only_when_private_on: Option<bool>,

    /// Log every pipeline decision at info level
    #[arg(long)]
    pub debug: Option<bool>,
}

#[derive(Subcommand)]
pub enum IdentityCommand {
    /// Print the learned nickname
    Show,
    /// Forget the learned nickname
    Forget,
}
