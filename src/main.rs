//! hubbridge CLI - HubSpot OAuth2 integration gateway
//!
//! Run with: cargo run -- serve
//! Or after build: ./target/release/hubbridge serve

#[tokio::main]
async fn main() {
    // Load .env before config so HUBSPOT_* credentials are visible
    let _ = dotenvy::dotenv();

    if let Err(e) = hubbridge::cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
