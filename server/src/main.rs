use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use conbook_server::config::Config;
use conbook_server::db::Database;
use conbook_server::routes::create_routes;
use conbook_server::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("conbook_server=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to open database");

    tracing::info!("Successfully connected to database");

    let state = AppState::new(db, config);
    state
        .media
        .ensure_root()
        .await
        .expect("Failed to create media directory");

    let addr = state.config.bind_addr;
    let app = create_routes(state);

    tracing::info!("🚀 Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
