use spellwise::papers::PredefinedPapers;
use spellwise::{AppConfig, AppState, PracticeService, build_app, seed};
use std::error::Error;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env();
    init_tracing(config.log_json);

    let catalogue = match &config.seed_path {
        Some(path) => seed::load_catalogue(path)?,
        None => seed::builtin_catalogue(),
    };
    let store = seed::populate(catalogue)?;
    let predefined = match &config.test_paper_map {
        Some(path) => seed::load_predefined(path)?,
        None => PredefinedPapers::default(),
    };

    let state = AppState::new(PracticeService::new(store, predefined), &config);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
