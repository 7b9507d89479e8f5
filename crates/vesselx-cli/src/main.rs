use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use vesselx_client::{
    BusEvent, ClientConfig, FileStore, UnsupportedPlatform, VesselClient,
};
use vesselx_types::events::GatewayEvent;

/// Headless VesselX session: log in, hold the gateway connection open, and
/// print what arrives until Ctrl-C.
///
///     vesselx <email> <password>
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vesselx=info,vesselx_client=info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (email, password) = match (args.next(), args.next()) {
        (Some(e), Some(p)) => (e, p),
        _ => {
            eprintln!("usage: vesselx <email> <password>");
            std::process::exit(2);
        }
    };

    let config = ClientConfig::from_env();
    info!("API at {}, gateway at {}", config.api_url, config.gateway_url);

    let store_path = std::env::var("VESSELX_STATE_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("vesselx-state.json"));

    let client = VesselClient::new(
        config,
        Arc::new(UnsupportedPlatform),
        Box::new(FileStore::open(store_path)),
    );

    let user = match client.restore_session().await? {
        Some(user) => {
            info!("restored session for {}", user.username);
            user
        }
        None => {
            let user = client.login(&email, &password).await?;
            info!("logged in as {}", user.username);
            user
        }
    };

    let mut bus_rx = client.bus().subscribe();
    let mut gateway_rx = client.gateway().subscribe();

    info!(
        "session up for {} ({} unread messages)",
        user.username,
        client.unread().snapshot().messages
    );

    loop {
        tokio::select! {
            event = gateway_rx.recv() => match event {
                Ok(GatewayEvent::DirectMessage { message }) => {
                    println!("[dm] {}: {}", message.sender.username, message.text);
                }
                Ok(GatewayEvent::GroupMessage { message }) => {
                    println!("[group] {}: {}", message.sender.username, message.text);
                }
                Ok(event) => info!("gateway event: {:?}", event),
                Err(e) => {
                    warn!("gateway feed lagged or closed: {}", e);
                    break;
                }
            },
            event = bus_rx.recv() => {
                if let Ok(BusEvent::UnreadCountUpdate { counter, value }) = event {
                    info!("unread {:?}: {}", counter, value);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    client.logout().await;
    Ok(())
}
