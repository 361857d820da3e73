//! Configuration management for the PDF signing server

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::delivery::DeliveryMode;
use crate::document::{clamp_zoom, DEFAULT_ZOOM};

/// Default request body limit (64 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub delivery: DeliveryConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body; larger requests get a 413
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub mode: DeliveryMode,
    /// Where stored documents are written (stored mode only)
    pub storage_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Preview zoom when the request does not choose one
    pub zoom: f32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            },
            delivery: DeliveryConfig {
                mode: DeliveryMode::Inline,
                storage_dir: PathBuf::from("./signed"),
            },
            render: RenderConfig { zoom: DEFAULT_ZOOM },
        }
    }
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    ///
    /// Unset variables take their defaults; unparseable ones are logged and
    /// also take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let zoom = parse_or(&lookup, "RENDER_ZOOM", defaults.render.zoom);
        let zoom = if zoom > 0.0 && zoom.is_finite() {
            clamp_zoom(zoom)
        } else {
            tracing::warn!(value = zoom, "RENDER_ZOOM must be positive, using default");
            defaults.render.zoom
        };

        let max_body_bytes = parse_or(&lookup, "MAX_BODY_BYTES", defaults.server.max_body_bytes);
        let max_body_bytes = if max_body_bytes == 0 {
            tracing::warn!("MAX_BODY_BYTES must be non-zero, using default");
            defaults.server.max_body_bytes
        } else {
            max_body_bytes
        };

        Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_or(&lookup, "SERVER_PORT", defaults.server.port),
                max_body_bytes,
            },
            delivery: DeliveryConfig {
                mode: parse_or(&lookup, "DELIVERY_MODE", defaults.delivery.mode),
                storage_dir: lookup("STORAGE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.delivery.storage_dir),
            },
            render: RenderConfig { zoom },
        }
    }

    /// Address to bind, as `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!(key = key, value = %raw, "Invalid value ({}), using default", e);
            default
        }),
        None => default,
    }
}
