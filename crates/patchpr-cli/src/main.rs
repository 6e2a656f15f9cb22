//! patchpr CLI - publish agent patches as GitHub branches and pull requests.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    output::set_quiet(cli.quiet);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Publish {
            change_set,
            activities,
            patch,
            repo,
            message,
            base_commit,
            base,
            branch_only,
            json,
        } => commands::publish::run(
            config,
            commands::publish::Source::from_args(
                change_set,
                activities,
                patch,
                repo,
                message,
                base_commit,
            ),
            base,
            branch_only,
            json,
        ),
        Commands::Parse { input, json } => commands::parse::run(&input, json),
        Commands::Apply {
            patch,
            path,
            original,
            strict,
        } => commands::apply::run(&patch, &path, original.as_deref(), strict),
        Commands::Branches { repo, json } => commands::branches::run(config, &repo, json),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        let mut shown = e.to_string();
        output::error(&shown);
        for cause in e.chain().skip(1) {
            let text = cause.to_string();
            if !shown.contains(&text) {
                output::cause(&text);
            }
            shown = text;
        }
        std::process::exit(1);
    }
}

/// Log to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}
