use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::grid::GridShape;

pub const DEFAULT_SNAP_DISTANCE: f64 = 30.0;
pub const DEFAULT_SCATTER_SPACING: f64 = 1.25;
pub const DEFAULT_TARGET_PIECES: u32 = 12;

/// Which neighbour a released group fuses with when several are in range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapPolicy {
    /// First qualifying neighbour in ascending id order.
    #[default]
    First,
    /// Closest qualifying neighbour.
    Nearest,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapSettings {
    pub distance: f64,
    pub policy: SnapPolicy,
}

impl Default for SnapSettings {
    fn default() -> Self {
        SnapSettings {
            distance: DEFAULT_SNAP_DISTANCE,
            policy: SnapPolicy::First,
        }
    }
}

/// Board options. Every field is optional in JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub snap_distance: f64,
    pub scatter_spacing: f64,
    pub snap_policy: SnapPolicy,
    pub grid: GridShape,
    /// Fixed seed for reproducible boards; entropy when absent.
    pub seed: Option<u64>,
    /// Piece count the grid chooser aims for once the image size is known.
    pub target_pieces: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            snap_distance: DEFAULT_SNAP_DISTANCE,
            scatter_spacing: DEFAULT_SCATTER_SPACING,
            snap_policy: SnapPolicy::First,
            grid: GridShape::default(),
            seed: None,
            target_pieces: DEFAULT_TARGET_PIECES,
        }
    }
}

impl BoardConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: BoardConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.is_empty() {
            return Err(ConfigError::EmptyGrid {
                nx: self.grid.nx,
                ny: self.grid.ny,
            });
        }
        if !self.snap_distance.is_finite() || self.snap_distance <= 0.0 {
            return Err(ConfigError::SnapDistance(self.snap_distance));
        }
        if !self.scatter_spacing.is_finite() || self.scatter_spacing < 1.0 {
            return Err(ConfigError::ScatterSpacing(self.scatter_spacing));
        }
        Ok(())
    }

    pub fn snap(&self) -> SnapSettings {
        SnapSettings {
            distance: self.snap_distance,
            policy: self.snap_policy,
        }
    }
}
