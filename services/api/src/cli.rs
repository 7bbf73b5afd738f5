use crate::report::{run_evaluate, run_labels, EvaluateArgs, LabelsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use forest_dss::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Forest Rights DSS",
    about = "Score forest-rights records against welfare schemes and export rule-derived labels",
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
    /// Evaluate one CSV row and print the per-scheme results
    Evaluate(EvaluateArgs),
    /// Apply the family rules to every CSV row and write a labelled training file
    Labels(LabelsArgs),
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
        Command::Evaluate(args) => run_evaluate(args),
        Command::Labels(args) => run_labels(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use forest_dss::eligibility::RecordFamily;
    use std::path::PathBuf;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["forest-dss-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn evaluate_defaults_to_the_first_row() {
        let cli = Cli::try_parse_from([
            "forest-dss-api",
            "evaluate",
            "--family",
            "CR",
            "--csv",
            "data/FINAL_CR_FormB.csv",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Evaluate(args)) => {
                assert_eq!(args.family, RecordFamily::Cr);
                assert_eq!(args.csv, PathBuf::from("data/FINAL_CR_FormB.csv"));
                assert_eq!(args.row, 0);
            }
            other => panic!("expected evaluate, got {other:?}"),
        }
    }

    #[test]
    fn unknown_family_is_rejected_at_parse_time() {
        let parsed = Cli::try_parse_from([
            "forest-dss-api",
            "labels",
            "--family",
            "fra",
            "--input",
            "in.csv",
            "--output",
            "out.csv",
        ]);
        assert!(parsed.is_err());
    }
}
