use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tokio::net::TcpListener;

use classledgerd::http::{build_router, AppState, ServerConfig};
use classledgerd::store;

#[derive(Parser)]
#[command(name = "classledgerd")]
#[command(
    about = "Bridges Google Classroom rosters, grades and attendance into a points-and-rank ledger spreadsheet",
    long_about = None
)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:5000")]
    bind: String,
    /// Directory holding the durable credential store
    #[arg(long, default_value = ".")]
    workspace: PathBuf,
    /// Public base URL used to build the OAuth redirect URI
    #[arg(long, default_value = "http://localhost:5000")]
    external_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let store = store::open_store(&cli.workspace)?;
    let state = Arc::new(AppState {
        cfg: ServerConfig {
            external_url: cli.external_url,
        },
        http: reqwest::Client::new(),
        store: Mutex::new(store),
    });

    let app = build_router(state);
    let listener = TcpListener::bind(&cli.bind).await?;
    log::info!("classledgerd listening on http://{}", cli.bind);
    axum::serve(listener, app).await?;
    Ok(())
}
