use movie_rec_api::{
    api::{create_router, AppState},
    config::Config,
    dataset::Dataset,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    // The dataset is loaded and indexed once; nothing is served until it succeeds
    let state = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<AppState> {
            let dataset = Dataset::load(&config.movies_path, &config.ratings_path)?;
            Ok(AppState::from_dataset(dataset, &config))
        })
        .await??
    };

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
