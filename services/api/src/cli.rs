use crate::report::{run_report, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use training_insights::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Training Insights",
    about = "Serve or print the employee training results dashboard",
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
    /// Load a training results file once and print the dashboard
    Report(ReportArgs),
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
        Command::Report(args) => run_report(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["training-insights-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn report_accepts_filters() {
        let cli = Cli::try_parse_from([
            "training-insights-api",
            "report",
            "--file",
            "results.xlsx",
            "--department",
            "Продажи",
            "--json",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Report(args)) => {
                assert_eq!(args.department.as_deref(), Some("Продажи"));
                assert!(args.json);
                assert!(!args.csv);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
