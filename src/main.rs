//! Phaseflow CLI - drive a project record through a phased workflow

use clap::Parser;
use phaseflow::cli::commands;
use phaseflow::cli::{ArtifactAction, Cli, Commands, PhaseAction, TaskAction};
use phaseflow::errors::to_exit_code;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the flags
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(to_exit_code(&e));
        }
    }
}

fn run(cli: Cli) -> phaseflow::Result<()> {
    let cwd = cli.cwd.as_deref();
    match cli.command {
        Some(Commands::Init {
            name,
            project_type,
            description,
            force,
        }) => commands::init::run(cwd, &name, project_type.as_deref(), description.as_deref(), force),
        Some(Commands::Status { json }) => commands::status::run(cwd, json),
        Some(Commands::Workflows) => commands::workflows::run(),
        Some(Commands::CanFire { event }) => commands::events::can_fire(cwd, &event),
        Some(Commands::Fire { event }) => commands::events::fire(cwd, &event),
        Some(Commands::Advance) => commands::events::advance(cwd),
        Some(Commands::Artifact { action }) => match action {
            ArtifactAction::Add {
                phase,
                path,
                artifact_type,
            } => commands::artifact::add(cwd, &phase, &path, artifact_type.as_deref()),
            ArtifactAction::Approve {
                phase,
                path,
                assessment,
            } => commands::artifact::approve(cwd, &phase, &path, assessment.as_deref()),
        },
        Some(Commands::Task { action }) => match action {
            TaskAction::Add {
                phase,
                id,
                name,
                depends_on,
            } => commands::task::add(cwd, &phase, &id, &name, &depends_on),
            TaskAction::Status { phase, id, status } => {
                commands::task::set_status(cwd, &phase, &id, &status)
            }
        },
        Some(Commands::Phase { action }) => match action {
            PhaseAction::ApproveTasks { phase } => commands::phase::approve_tasks(cwd, &phase),
            PhaseAction::Complete { phase } => commands::phase::complete(cwd, &phase),
            PhaseAction::Skip { phase } => commands::phase::skip(cwd, &phase),
            PhaseAction::Enable { phase } => commands::phase::enable(cwd, &phase),
        },
        None => {
            // Default to showing help - clap handles this
            println!("Use --help for usage information");
            Ok(())
        }
    }
}
