use snapsweep::cli::{prompt_confirmation, AppConfig, Args, Command};
use snapsweep::config::UserConfig;
use snapsweep::store::directory::ConfirmFn;
use snapsweep::{
    format_bytes, AssetId, AssetStoreClient, DirectoryStore, JsonFileStore, KeyValueStore,
    SortStrategy, StorageInfo, SweepError, TriageEngine,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snapsweep=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse command line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    // Load user configuration
    let user_config = UserConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load user config, using defaults");
        UserConfig::default()
    });

    let config = match AppConfig::resolve(args, &user_config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs one command against the configured library
async fn run(config: &AppConfig) -> snapsweep::Result<()> {
    let mut store = DirectoryStore::new(&config.library);
    if let Command::Delete { yes: false, .. } = config.command {
        let confirm: ConfirmFn = Arc::new(prompt_confirmation);
        store = store.with_confirmation(confirm);
    }
    let store: Arc<dyn AssetStoreClient> = Arc::new(store);
    let state: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&config.state_file));

    let mut engine = TriageEngine::new(store, state).with_sort(config.default_sort);

    if !engine.request_access_and_refresh().await.is_granted() {
        println!(
            "Cannot read the photo library at {}.",
            config.library.display()
        );
        println!("Check that the folder exists and that snapsweep may read it, or pass --library.");
        return Ok(());
    }

    match &config.command {
        Command::Scan { sort, limit } => {
            if let Some(sort) = sort {
                engine.set_sort((*sort).into()).await;
            }
            print_scan(&engine, *limit).await;
        }
        Command::Protect { ids } => {
            for id in ids {
                let id = AssetId::from(id.as_str());
                if engine.toggle_protection(&id).await? {
                    println!("Protected   {}", id);
                } else {
                    println!("Unprotected {}", id);
                }
            }
            println!("{} candidates remain for review", engine.candidate_count());
        }
        Command::Vault => {
            let vault = engine.protected_assets();
            if vault.is_empty() {
                println!("No protected assets");
            }
            for asset in vault {
                println!("  {}", asset.id);
            }
            println!("{} protected", engine.protected_ids().len());
        }
        Command::Delete {
            ids, all, dry_run, ..
        } => delete(&mut engine, ids, *all, *dry_run).await?,
        Command::Stats => {
            let info = StorageInfo::for_path(&config.library);
            println!(
                "Storage used:     {} of {} ({:.0}%)",
                format_bytes(info.used_bytes()),
                format_bytes(info.total_bytes),
                info.used_fraction() * 100.0
            );
            println!(
                "Space reclaimed:  {}",
                format_bytes(engine.total_bytes_reclaimed())
            );
            println!("Images:           {}", engine.total_count());
            println!("Screenshots:      {}", engine.candidate_count());
            println!("Protected:        {}", engine.protected_ids().len());
        }
    }

    Ok(())
}

async fn print_scan(engine: &TriageEngine, limit: Option<usize>) {
    let sort: SortStrategy = engine.sort_strategy();
    println!(
        "{} images, {} screenshots to review ({})",
        engine.total_count(),
        engine.candidate_count(),
        sort.label()
    );

    let shown = limit.unwrap_or(usize::MAX);
    for asset in engine.candidates().iter().take(shown) {
        let date = asset
            .creation_date
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown date    ".to_string());
        let size = format_bytes(engine.size_of(asset).await);
        println!("  {}  {:>10}  {}", date, size, asset.id);
    }

    let hidden = engine.candidate_count().saturating_sub(shown);
    if hidden > 0 {
        println!("  ... and {} more", hidden);
    }
}

async fn delete(
    engine: &mut TriageEngine,
    ids: &[String],
    all: bool,
    dry_run: bool,
) -> snapsweep::Result<()> {
    if all {
        engine.select_all();
    } else {
        for id in ids {
            if engine.toggle_selection(&AssetId::from(id.as_str())).is_none() {
                eprintln!("Skipping {}: not a review candidate", id);
            }
        }
    }

    let count = engine.selected_ids().len();
    if count == 0 {
        println!("Nothing selected");
        return Ok(());
    }

    let bytes = engine.selected_total_bytes().await;
    if dry_run {
        println!(
            "[DRY RUN] Would move {} screenshots ({}) to the trash",
            count,
            format_bytes(bytes)
        );
        return Ok(());
    }

    match engine.delete_selected().await {
        Ok(outcome) => {
            println!(
                "Moved {} screenshots to the trash, reclaiming {}",
                outcome.requested,
                format_bytes(outcome.bytes_reclaimed)
            );
            println!(
                "Lifetime total:  {}",
                format_bytes(outcome.total_bytes_reclaimed)
            );
            if !outcome.state_saved {
                eprintln!("Warning: the state file could not be fully updated");
            }
            Ok(())
        }
        Err(SweepError::DeleteRequestFailed(reason)) => {
            println!("Deletion did not complete ({}). Nothing was changed.", reason);
            Ok(())
        }
        Err(e) => Err(e),
    }
}
