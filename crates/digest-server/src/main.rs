//! paper-digest: classify daily paper snapshots against interest topics.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use digest_server::{pipeline, routes, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn resolve_data_dir() -> PathBuf {
    std::env::var("DIGEST_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn load_state(data_dir: &Path) -> anyhow::Result<AppState> {
    info!("Data directory: {}", data_dir.display());
    let config = digest_core::DigestConfig::from_env(data_dir)?;
    let embedder = digest_infer::create_embedder(&config.model_dir);
    AppState::new(config, embedder).map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))
}

fn print_help() {
    println!("paper-digest: two-layer topic matching for daily paper snapshots");
    println!();
    println!("Usage: paper-digest [command]");
    println!();
    println!("Commands:");
    println!("  serve (default)          Start the HTTP server");
    println!("  run                      Classify stored snapshots and write report.json");
    println!("  validate [data-dir]      Check configuration, topics and snapshots");
    println!("  help                     Show this help message");
    println!();
    println!("Environment: DIGEST_DATA_DIR, PORT, DIGEST_EMBEDDING_THRESHOLD, RUST_LOG");
}

async fn serve(data_dir: PathBuf) -> anyhow::Result<()> {
    let state = Arc::new(load_state(&data_dir)?);
    let port = state.config.port;

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("paper-digest listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("serve");

    match command {
        "serve" => serve(resolve_data_dir()).await,
        "run" => {
            let state = load_state(&resolve_data_dir())?;
            let today = chrono::Local::now().date_naive();
            let summary = pipeline::run(&state, today)?;
            info!(
                "Done: {} days, {} matched, {} newly seen, {} snapshots pruned -> {}",
                summary.days,
                summary.matched,
                summary.recorded,
                summary.pruned.removed.len(),
                summary.report_path.display()
            );
            Ok(())
        }
        "--validate" | "validate" => {
            let data_dir = args.get(2).map(PathBuf::from).unwrap_or_else(resolve_data_dir);
            match load_state(&data_dir).and_then(|state| pipeline::validate(&state).map_err(Into::into)) {
                Ok(report) => {
                    pipeline::print_validation(&report);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("Validation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        "--help" | "-h" | "help" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}. Use 'paper-digest help' for usage.", other);
            std::process::exit(1);
        }
    }
}
