use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "hb-cli")]
#[command(about = "Runs bridge scripts against a recording platform layer")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    #[arg(long = "script")]
    pub(crate) script: String,
    /// Directory `sys.read` resolves against; defaults to the script's directory.
    #[arg(long = "assets-dir")]
    pub(crate) assets_dir: Option<String>,
    /// Widget name to click after the script ran. Repeatable, applied in order.
    #[arg(long = "click")]
    pub(crate) click: Vec<String>,
    #[arg(long = "spacing")]
    pub(crate) spacing: Option<i64>,
    #[arg(long = "padding")]
    pub(crate) padding: Option<i64>,
    #[arg(long = "callback-name", default_value = "tc")]
    pub(crate) callback_name: String,
}
