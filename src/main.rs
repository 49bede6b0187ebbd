use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use pokedex_sync::{
    cli::{Cli, Commands, ImportArgs},
    import::ImportOrchestrator,
    source::PokeApiClient,
    Phase, SilentUi, Stage, StageOptions, Store, UiApp,
};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Import { args } => {
            run_import(&args, ImportOrchestrator::new)?;
        }

        Commands::Stage { name, args } => {
            let stage: Stage = name.parse()?;
            run_import(&args, |options| ImportOrchestrator::single(stage, options))?;
        }

        Commands::Status { import_id, db } => {
            let db_path = db.resolve()?;
            if !db_path.exists() {
                bail!("No database at {:?}", db_path);
            }
            let store = Store::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?;

            let run = match &import_id {
                Some(id) => store.load_import_run(id)?,
                None => store.latest_import_run()?,
            };
            match run {
                Some(run) => println!("{}", serde_json::to_string_pretty(&run)?),
                None => match import_id {
                    Some(id) => bail!("No import with id {}", id),
                    None => bail!("No imports recorded in {:?}", db_path),
                },
            }
        }

        Commands::ListStages => {
            println!("Import stages:\n");
            for (i, stage) in Stage::ALL.iter().enumerate() {
                let deps: Vec<_> = stage.dependencies().iter().map(|d| d.cli_name()).collect();
                if deps.is_empty() {
                    println!("  {}. {:<16} {}", i + 1, stage.cli_name(), stage.label());
                } else {
                    println!(
                        "  {}. {:<16} {} (after {})",
                        i + 1,
                        stage.cli_name(),
                        stage.label(),
                        deps.join(", ")
                    );
                }
            }
        }
    }

    Ok(())
}

fn run_import(
    args: &ImportArgs,
    build: impl FnOnce(StageOptions) -> ImportOrchestrator,
) -> Result<()> {
    let config = args.to_config()?;
    if !args.tui {
        init_tracing();
    }

    let start = Instant::now();
    let store = Store::open(&config.db_path)
        .with_context(|| format!("Failed to open database {:?}", config.db_path))?;
    let client = PokeApiClient::new(config.client_config())?;
    let mut orchestrator = build(config.stage_options()).threads(config.threads);
    let import_id = config.import_id.as_deref();

    let summary = if args.tui {
        let mut ui = UiApp::new()?;
        match orchestrator.run(&client, &store, import_id, &mut ui) {
            Ok(summary) => {
                let line = format!(
                    "Import {} complete: {} imported, {} failed",
                    summary.import_id,
                    summary.imported(),
                    summary.failed()
                );
                ui.finish(Phase::Complete, &line)?;
                summary
            }
            Err(e) => {
                ui.finish(Phase::Failed, &e.to_string())?;
                return Err(e.into());
            }
        }
    } else {
        orchestrator.run(&client, &store, import_id, &mut SilentUi::new())?
    };

    println!(
        "\nImport {} finished in {:.1}s into {:?}",
        summary.import_id,
        start.elapsed().as_secs_f64(),
        config.db_path
    );
    for (stage, outcome) in &summary.outcomes {
        println!(
            "  {:<18} {:>6} imported {:>4} failed",
            stage.label(),
            outcome.imported,
            outcome.failed
        );
    }

    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pokedex_sync=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
