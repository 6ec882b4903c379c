//! Server configuration.

use crate::arena::ObstacleLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "SQUARE_ARENA_CONFIG";

/// Invalid startup settings. Fatal before the session starts, never afterwards.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("session.player_count must be at least 4 (one per arena corner), got {0}")]
    TooFewPlayers(usize),

    #[error("{0} must be positive")]
    NonPositive(&'static str),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub arena: ArenaConfig,
    #[serde(default)]
    pub square: SquareConfig,
    #[serde(default)]
    pub obstacle: ObstacleConfig,
    #[serde(default)]
    pub bullet: BulletConfig,
}

impl Config {
    /// Load configuration from `$SQUARE_ARENA_CONFIG` or `config.toml`, writing defaults when
    /// the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml"));

        if path.exists() {
            Ok(Self::load_from(&path)?)
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(&path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }

    /// Load and validate configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.player_count < 4 {
            return Err(ConfigError::TooFewPlayers(self.session.player_count));
        }

        let positive = [
            ("arena.width", self.arena.width),
            ("arena.height", self.arena.height),
            ("square.size", self.square.size),
            ("square.speed", self.square.speed),
            ("obstacle.size", self.obstacle.size),
            ("bullet.size", self.bullet.size),
            ("bullet.speed", self.bullet.speed),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::NonPositive(name));
            }
        }

        let positive_ints = [
            ("square.health", self.square.health),
            ("obstacle.health", self.obstacle.health),
            ("bullet.damage", self.bullet.damage),
        ];
        for (name, value) in positive_ints {
            if value <= 0 {
                return Err(ConfigError::NonPositive(name));
            }
        }

        if self.server.tick_interval_ms == 0 {
            return Err(ConfigError::NonPositive("server.tick_interval_ms"));
        }
        if self.server.outbound_buffer == 0 {
            return Err(ConfigError::NonPositive("server.outbound_buffer"));
        }
        Ok(())
    }
}

/// Server networking settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Listen on all interfaces (true) or on localhost only (false).
    #[serde(default = "default_public")]
    pub public: bool,
    /// Tick interval in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Seconds a joined player has to open its WebSocket before the slot returns to a bot.
    #[serde(default = "default_join_timeout")]
    pub join_timeout_secs: u64,
    /// World updates queued per connection before frames are dropped.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            public: default_public(),
            tick_interval_ms: default_tick_interval(),
            join_timeout_secs: default_join_timeout(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

impl ServerConfig {
    /// Address the HTTP server binds to.
    pub fn bind_address(&self) -> [u8; 4] {
        if self.public { [0, 0, 0, 0] } else { [127, 0, 0, 1] }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.join_timeout_secs)
    }
}

fn default_port() -> u16 {
    8080
}
fn default_public() -> bool {
    true
}
fn default_tick_interval() -> u64 {
    16
}
fn default_join_timeout() -> u64 {
    10
}
fn default_outbound_buffer() -> usize {
    8
}

/// Per-session settings chosen when the server starts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Arena capacity: number of squares (players + bots).
    #[serde(default = "default_player_count")]
    pub player_count: usize,
    /// Obstacle density: "low", "medium" or "high".
    #[serde(default)]
    pub obstacle_level: ObstacleLevel,
    /// Bullets bounce off obstacles instead of being destroyed.
    #[serde(default)]
    pub ricochet: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            player_count: default_player_count(),
            obstacle_level: ObstacleLevel::default(),
            ricochet: false,
        }
    }
}

fn default_player_count() -> usize {
    4
}

/// Base arena dimensions before scaling by player count.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArenaConfig {
    #[serde(default = "default_arena_width")]
    pub width: f32,
    #[serde(default = "default_arena_height")]
    pub height: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: default_arena_width(),
            height: default_arena_height(),
        }
    }
}

fn default_arena_width() -> f32 {
    1280.0
}
fn default_arena_height() -> f32 {
    720.0
}

/// Square defaults (restored on every respawn).
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct SquareConfig {
    #[serde(default = "default_square_health")]
    pub health: i32,
    #[serde(default = "default_square_size")]
    pub size: f32,
    /// Movement speed in world units per second.
    #[serde(default = "default_square_speed")]
    pub speed: f32,
}

impl Default for SquareConfig {
    fn default() -> Self {
        Self {
            health: default_square_health(),
            size: default_square_size(),
            speed: default_square_speed(),
        }
    }
}

fn default_square_health() -> i32 {
    100
}
fn default_square_size() -> f32 {
    30.0
}
fn default_square_speed() -> f32 {
    200.0
}

/// Obstacle defaults.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ObstacleConfig {
    #[serde(default = "default_obstacle_health")]
    pub health: i32,
    #[serde(default = "default_obstacle_size")]
    pub size: f32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            health: default_obstacle_health(),
            size: default_obstacle_size(),
        }
    }
}

fn default_obstacle_health() -> i32 {
    100
}
fn default_obstacle_size() -> f32 {
    50.0
}

/// Weapon settings shared by every square.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct BulletConfig {
    #[serde(default = "default_bullet_damage")]
    pub damage: i32,
    #[serde(default = "default_bullet_size")]
    pub size: f32,
    /// Bullet speed in world units per second.
    #[serde(default = "default_bullet_speed")]
    pub speed: f32,
}

impl Default for BulletConfig {
    fn default() -> Self {
        Self {
            damage: default_bullet_damage(),
            size: default_bullet_size(),
            speed: default_bullet_speed(),
        }
    }
}

fn default_bullet_damage() -> i32 {
    20
}
fn default_bullet_size() -> f32 {
    8.0
}
fn default_bullet_speed() -> f32 {
    600.0
}
