use crate::demo::{run_demo, run_policy_check, DemoArgs, PolicyCheckArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use visitation::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Visitation Service",
    about = "Run and demonstrate the jail visitation request service from the command line",
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
    /// Inspect the visiting-day policy without submitting anything
    Policy {
        #[command(subcommand)]
        command: PolicyCommand,
    },
    /// Walk a visit request from submission to the checkpoint scan
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum PolicyCommand {
    /// Check whether a relationship may book a given date and time
    Check(PolicyCheckArgs),
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
        Command::Policy {
            command: PolicyCommand::Check(args),
        } => run_policy_check(args),
        Command::Demo(args) => run_demo(args),
    }
}
