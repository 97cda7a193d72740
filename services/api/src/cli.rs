use crate::score::{run_score, ScoreCommand};
use crate::server;
use clap::{Args, Parser, Subcommand};
use faculty_appraisal::config::AppConfig;
use faculty_appraisal::error::AppError;
use faculty_appraisal::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "Faculty Appraisal Portal",
    about = "Serve the faculty appraisal portal or score appraisal parts from the command line",
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
    /// Score appraisal parts offline without contacting the backend
    Score {
        #[command(subcommand)]
        command: ScoreCommand,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the appraisal backend base URL
    #[arg(long)]
    pub(crate) backend_url: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score { command } => {
            let (environment, config) = AppConfig::load_telemetry();
            telemetry::init(environment, &config)?;
            run_score(command)
        }
    }
}
