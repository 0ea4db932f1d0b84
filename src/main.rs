//! poll-hub server binary
//!
//! Run with: poll-hub [BIND_ADDR]
//!
//! Examples:
//!   poll-hub                        # binds to 0.0.0.0:5050 (or $PORT)
//!   poll-hub localhost              # binds to 127.0.0.1:5050
//!   poll-hub 127.0.0.1:6060         # binds to 127.0.0.1:6060
//!
//! Log verbosity follows `RUST_LOG`, e.g. `RUST_LOG=poll_hub=debug`.

use std::net::SocketAddr;

use poll_hub::server::config::DEFAULT_PORT;
use poll_hub::{PollServer, ServerConfig};

fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    // Replace "localhost" with "127.0.0.1"
    let normalized = arg.replace("localhost", "127.0.0.1");

    // Try parsing as SocketAddr first (includes port)
    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    // Try parsing as IP address without port
    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: poll-hub [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:{})", DEFAULT_PORT);
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PORT                        Listen port when BIND_ADDR is absent");
    eprintln!("  POLL_HUB_ADDR               Listen address when BIND_ADDR is absent");
    eprintln!("  POLL_HUB_ALLOWED_ORIGINS    Comma-separated origins allowed to connect");
    eprintln!("  POLL_HUB_MAX_CONNECTIONS    Concurrent connection cap");
    eprintln!("  RUST_LOG                    Log filter (default: poll_hub=info)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => Some(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => None,
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("poll_hub=info")),
        )
        .init();

    let mut config = ServerConfig::from_env();
    if let Some(addr) = bind_addr {
        config = config.bind(addr);
    }

    let server = PollServer::bind(config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Server error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    if let Ok(stats) = server.hub().stats().await {
        tracing::info!(
            connections = stats.total_connections,
            polls = stats.polls_created,
            votes = stats.votes_cast,
            messages = stats.messages_posted,
            uptime_secs = stats.uptime.as_secs(),
            registration_ratio = stats.registration_ratio(),
            "Final stats"
        );
    }

    server.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_addr() {
        assert_eq!(
            parse_bind_addr("127.0.0.1:6060").unwrap(),
            "127.0.0.1:6060".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            parse_bind_addr("localhost").unwrap(),
            SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT))
        );
        assert_eq!(
            parse_bind_addr("localhost:7000").unwrap().port(),
            7000
        );
        assert!(parse_bind_addr("not an address").is_err());
    }
}
