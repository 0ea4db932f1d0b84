//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Default listen port
pub const DEFAULT_PORT: u16 = 5050;

/// Shortest ping interval the writer will use
pub const MIN_PING_INTERVAL: Duration = Duration::from_millis(100);

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Origins allowed to upgrade (empty = any origin)
    pub allowed_origins: Vec<String>,

    /// Per-connection outbound queue length
    pub send_queue_capacity: usize,

    /// Hub command queue length
    pub command_queue_capacity: usize,

    /// Interval between server pings
    pub ping_interval: Duration,

    /// Close a connection that sends nothing for this long
    pub idle_timeout: Duration,

    /// Chat messages kept for replay (None = unbounded)
    pub chat_history_limit: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 0, // Unlimited
            allowed_origins: Vec::new(),
            send_queue_capacity: 256,
            command_queue_capacity: 1024,
            ping_interval: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(90),
            chat_history_limit: None,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Defaults overlaid with environment variables
    ///
    /// - `PORT`: listen port, keeping the default interface
    /// - `POLL_HUB_ADDR`: full socket address, wins over `PORT`
    /// - `POLL_HUB_ALLOWED_ORIGINS`: comma-separated origin allow-list
    /// - `POLL_HUB_MAX_CONNECTIONS`: connection cap
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => config.bind_addr.set_port(port),
                Err(e) => tracing::warn!(value = %port, error = %e, "Ignoring invalid PORT"),
            }
        }

        if let Some(addr) = lookup("POLL_HUB_ADDR") {
            match addr.trim().parse::<SocketAddr>() {
                Ok(addr) => config.bind_addr = addr,
                Err(e) => tracing::warn!(value = %addr, error = %e, "Ignoring invalid POLL_HUB_ADDR"),
            }
        }

        if let Some(origins) = lookup("POLL_HUB_ALLOWED_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(max) = lookup("POLL_HUB_MAX_CONNECTIONS") {
            match max.trim().parse::<usize>() {
                Ok(max) => config.max_connections = max,
                Err(e) => {
                    tracing::warn!(value = %max, error = %e, "Ignoring invalid POLL_HUB_MAX_CONNECTIONS")
                }
            }
        }

        config
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Allow an origin to connect
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origins.push(origin.into());
        self
    }

    /// Set the per-connection outbound queue length
    pub fn send_queue_capacity(mut self, capacity: usize) -> Self {
        self.send_queue_capacity = capacity.max(1);
        self
    }

    /// Set ping interval, clamped to [`MIN_PING_INTERVAL`]
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval.max(MIN_PING_INTERVAL);
        self
    }

    /// Set idle timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Cap the chat log
    pub fn chat_history_limit(mut self, limit: usize) -> Self {
        self.chat_history_limit = Some(limit);
        self
    }
}
