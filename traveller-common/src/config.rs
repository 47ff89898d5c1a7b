use serde::{Deserialize, Serialize};
use anyhow::{Context, Result};
use crate::sim_params::SimParams;
use std::path::Path;
use std::time::Duration;

/// Largest slot count whose ids still fit the two-digit cell rendering.
pub const MAX_SLOTS: u32 = 100;

// Configuration for the board dimensions
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BoardConfig {
    pub rows: u32,
    pub cols: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig { rows: 7, cols: 7 }
    }
}

// Spawning and movement behaviour of travellers
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TravellerConfig {
    /// Number of spawner slots; each slot materializes at most one traveller.
    pub slots: u32,
    /// Percent chance (0-100) that a waiting spawner fires on a given check.
    pub spawn_probability_percent: u32,
    /// Percent chance (0-100) that an active traveller attempts a move on a given check.
    pub move_probability_percent: u32,
    pub spawn_interval_ms: u64,
    pub move_interval_ms: u64,
}

impl Default for TravellerConfig {
    fn default() -> Self {
        TravellerConfig {
            slots: 4,
            spawn_probability_percent: 10,
            move_probability_percent: 50,
            spawn_interval_ms: 1000,
            move_interval_ms: 1000,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => anyhow::bail!("Unknown output format '{}' (expected 'text' or 'json').", other),
        }
    }
}

// Configuration for the periodic snapshot reporter
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SnapshotConfig {
    pub interval_ms: u64,
    pub format: OutputFormat,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        SnapshotConfig {
            interval_ms: 3000,
            format: OutputFormat::Text,
        }
    }
}

// Process-level run settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct RunConfig {
    /// Base seed for the per-unit RNG streams. Entropy-seeded when absent.
    pub seed: Option<u64>,
    /// Stop after this many seconds. Runs until killed when absent.
    pub duration_secs: Option<u64>,
}

// Main simulation configuration structure, loaded from a TOML file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SimulationConfig {
    pub board: BoardConfig,
    pub travellers: TravellerConfig,
    pub snapshot: SnapshotConfig,
    pub run: RunConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read config file '{}'", path_ref.display()))?;
        let config = Self::from_toml_str(&config_str)
            .with_context(|| format!("Invalid config file '{}'", path_ref.display()))?;

        Ok(config)
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        let board = &self.board;
        let travellers = &self.travellers;

        if board.rows == 0 || board.cols == 0 {
            anyhow::bail!("Board dimensions must be positive (got {}x{}).", board.rows, board.cols);
        }
        if travellers.slots == 0 {
            anyhow::bail!("slots must be greater than 0.");
        }
        if travellers.slots > MAX_SLOTS {
            anyhow::bail!("slots must be at most {} (got {}).", MAX_SLOTS, travellers.slots);
        }
        let capacity = u64::from(board.rows) * u64::from(board.cols);
        if u64::from(travellers.slots) > capacity {
            anyhow::bail!(
                "slots ({}) exceeds board capacity ({}x{} = {} cells).",
                travellers.slots, board.rows, board.cols, capacity
            );
        }
        if travellers.spawn_probability_percent > 100 {
            anyhow::bail!("spawn_probability_percent must be within 0..=100.");
        }
        if travellers.move_probability_percent > 100 {
            anyhow::bail!("move_probability_percent must be within 0..=100.");
        }
        if travellers.spawn_interval_ms == 0 || travellers.move_interval_ms == 0 {
            anyhow::bail!("Spawn and move intervals must be positive.");
        }
        if self.snapshot.interval_ms == 0 {
            anyhow::bail!("Snapshot interval must be positive.");
        }

        Ok(())
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        SimParams {
            rows: self.board.rows as usize,
            cols: self.board.cols as usize,
            slots: self.travellers.slots as usize,
            spawn_probability: self.travellers.spawn_probability_percent.min(100) as u8,
            move_probability: self.travellers.move_probability_percent.min(100) as u8,
            spawn_interval: Duration::from_millis(self.travellers.spawn_interval_ms),
            move_interval: Duration::from_millis(self.travellers.move_interval_ms),
            snapshot_interval: Duration::from_millis(self.snapshot.interval_ms),
            format: self.snapshot.format,
            seed: self.run.seed,
        }
    }

    pub fn run_duration(&self) -> Option<Duration> {
        self.run.duration_secs.map(Duration::from_secs)
    }
}
