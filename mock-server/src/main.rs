use petfriends_mock::{AppState, Quirks};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let email = std::env::var("MOCK_EMAIL").unwrap_or_else(|_| "user@example.com".to_string());
    let password = std::env::var("MOCK_PASSWORD").unwrap_or_else(|_| "password".to_string());
    let quirks = match std::env::var("MOCK_LENIENT").as_deref() {
        Ok("1") | Ok("true") => Quirks::all(),
        _ => Quirks::default(),
    };

    let state = AppState::new(quirks);
    state.add_account(&email, &password).await;
    info!(%email, ?quirks, "registered account");

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on {addr}");
    petfriends_mock::run(listener, state).await
}
