use crate::demo::{
    run_channel_report, run_demo, run_export, ChannelReportArgs, DemoArgs, ExportArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use owner_leads::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Owner Lead Pipeline",
    about = "Run and demonstrate the owner lead pipeline from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print analytics over the demo lead dataset
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
    /// Export the demo lead dataset
    Export {
        #[command(subcommand)]
        command: ExportCommand,
    },
    /// Walk one owner from intake to portfolio and print each step
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Lead volume and conversion per marketing channel
    Channels(ChannelReportArgs),
}

#[derive(Subcommand, Debug)]
enum ExportCommand {
    /// Write every lead as CSV
    Leads(ExportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report {
            command: ReportCommand::Channels(args),
        } => run_channel_report(args),
        Command::Export {
            command: ExportCommand::Leads(args),
        } => run_export(args),
        Command::Demo(args) => run_demo(args),
    }
}
