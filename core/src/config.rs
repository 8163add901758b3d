use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::Rect;

pub const SOLVE_TOLERANCE_DEFAULT: f32 = 0.1;
pub const ROTATION_INCREMENT_DEG: f32 = 90.0;
pub const ROTATION_SPEED_DEG_DEFAULT: f32 = 450.0;
pub const ROTATION_SETTLE_TOLERANCE_DEG: f32 = 0.001;
pub const PIECE_THICKNESS_DEFAULT: f32 = 0.01;
pub const CONTACT_SKIN_DEFAULT: f32 = 0.01;
pub const FIXED_TIMESTEP_DEFAULT: f32 = 0.02;

/// Tunables of the interlock simulation. Every field has a default, so a TOML
/// file only needs to name what it overrides.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Per-axis positional and rotational slack still accepted as solved.
    pub solve_tolerance: f32,
    pub rotation_increment_deg: f32,
    /// Angular speed of a tap rotation, in degrees per second.
    pub rotation_speed_deg: f32,
    pub rotation_settle_tolerance_deg: f32,
    /// Depth step placing a manipulated body in front of what it touches.
    pub piece_thickness: f32,
    /// Margin under which two abutting bounds still count as touching.
    pub contact_skin: f32,
    pub fixed_timestep: f32,
    pub play_area: Option<Rect>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            solve_tolerance: SOLVE_TOLERANCE_DEFAULT,
            rotation_increment_deg: ROTATION_INCREMENT_DEG,
            rotation_speed_deg: ROTATION_SPEED_DEG_DEFAULT,
            rotation_settle_tolerance_deg: ROTATION_SETTLE_TOLERANCE_DEG,
            piece_thickness: PIECE_THICKNESS_DEFAULT,
            contact_skin: CONTACT_SKIN_DEFAULT,
            fixed_timestep: FIXED_TIMESTEP_DEFAULT,
            play_area: None,
        }
    }
}

impl TableConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: TableConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("solve_tolerance", self.solve_tolerance)?;
        positive("rotation_increment_deg", self.rotation_increment_deg)?;
        positive("rotation_speed_deg", self.rotation_speed_deg)?;
        positive(
            "rotation_settle_tolerance_deg",
            self.rotation_settle_tolerance_deg,
        )?;
        positive("piece_thickness", self.piece_thickness)?;
        positive("fixed_timestep", self.fixed_timestep)?;
        if !self.contact_skin.is_finite() || self.contact_skin < 0.0 {
            return Err(ConfigError::Invalid {
                field: "contact_skin",
                reason: "must be a finite, non-negative number".to_string(),
            });
        }
        let turns = 360.0 / self.rotation_increment_deg;
        if (turns - turns.round()).abs() > 1e-4 {
            return Err(ConfigError::Invalid {
                field: "rotation_increment_deg",
                reason: "must divide 360 evenly".to_string(),
            });
        }
        if self.rotation_settle_tolerance_deg >= self.rotation_increment_deg * 0.5 {
            return Err(ConfigError::Invalid {
                field: "rotation_settle_tolerance_deg",
                reason: "must be smaller than half the rotation increment".to_string(),
            });
        }
        if let Some(area) = self.play_area {
            if !(area.width() > 0.0 && area.height() > 0.0) {
                return Err(ConfigError::Invalid {
                    field: "play_area",
                    reason: "max corner must lie beyond min corner".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be a finite, positive number (got {value})"),
        })
    }
}
