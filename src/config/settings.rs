use dotenv::dotenv;
use std::{env, net::SocketAddr, str::FromStr};

use crate::services::boxes::{table::BoxSizeTable, transitions::TransitionConfig};

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_port: u16,
    pub default_symbol: String,
    pub box_sizes: BoxSizeTable,
    pub frame_cap: usize,
    pub visible_offset: usize,
    pub visible_count: Option<usize>,
    pub json_limit: usize,
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_port: 8080,
            default_symbol: "EURUSD".into(),
            box_sizes: BoxSizeTable::default(),
            frame_cap: 1000,
            visible_offset: 0,
            visible_count: None,
            json_limit: 8 * 1024 * 1024,
            metrics_addr: None,
        }
    }
}

fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("{key} has an invalid value: {raw:?}").into()),
        _ => Ok(None),
    }
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv().ok(); // loads `.env` file automatically
        let d = Self::default();

        let box_sizes = match env::var("BOX_SIZES") {
            Ok(raw) => BoxSizeTable::parse(&raw).map_err(|e| format!("BOX_SIZES: {e}"))?,
            Err(_) => d.box_sizes,
        };

        Ok(Self {
            server_port: parse_var("SERVER_PORT")?.unwrap_or(d.server_port),
            default_symbol: env::var("DEFAULT_SYMBOL").unwrap_or(d.default_symbol),
            box_sizes,
            frame_cap: parse_var("FRAME_CAP")?.unwrap_or(d.frame_cap),
            visible_offset: parse_var("VISIBLE_OFFSET")?.unwrap_or(d.visible_offset),
            visible_count: parse_var("VISIBLE_COUNT")?,
            json_limit: parse_var("JSON_LIMIT")?.unwrap_or(d.json_limit),
            metrics_addr: parse_var("METRICS_ADDR")?,
        })
    }

    /// Transition settings for the display buffer.
    pub fn transition_config(&self) -> TransitionConfig {
        TransitionConfig {
            max_frames: self.frame_cap,
            visible_offset: self.visible_offset,
            visible_count: self.visible_count,
            ..TransitionConfig::default()
        }
    }
}
