/// Beam configuration shared by the generator and the web server.
///
/// All lengths are in metres.

use crate::error::ConfigError;
use crate::selector::GRID_SIZE;
use clap::Args;

/// Beam and sampling-grid parameters shared by every rendered mode.
#[derive(Debug, Clone, Args)]
pub struct BeamConfig {
    /// Samples per transverse axis
    #[arg(long, default_value_t = 256)]
    pub points: usize,
    /// Grid spans [-half_extent, half_extent] on both axes
    #[arg(long, default_value_t = 50e-6)]
    pub half_extent: f64,
    /// Distance from focus along the propagation axis
    #[arg(long, default_value_t = 100e-6)]
    pub z: f64,
    #[arg(long, default_value_t = 0.0)]
    pub x0: f64,
    #[arg(long, default_value_t = 0.0)]
    pub y0: f64,
    /// Waist along x; also the LG waist
    #[arg(long, default_value_t = 10e-6)]
    pub wx: f64,
    /// Waist along y
    #[arg(long, default_value_t = 10e-6)]
    pub wy: f64,
    #[arg(long, default_value_t = 800e-9)]
    pub wavelength: f64,
}

impl Default for BeamConfig {
    fn default() -> Self {
        BeamConfig {
            points: 256,
            half_extent: 50e-6,
            z: 100e-6,
            x0: 0.0,
            y0: 0.0,
            wx: 10e-6,
            wy: 10e-6,
            wavelength: 800e-9,
        }
    }
}

impl BeamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.points < 2 {
            return Err(ConfigError::GridPoints(self.points));
        }
        for (name, value) in [
            ("half_extent", self.half_extent),
            ("wx", self.wx),
            ("wy", self.wy),
            ("wavelength", self.wavelength),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        for (name, value) in [("z", self.z), ("x0", self.x0), ("y0", self.y0)] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
        }
        Ok(())
    }
}

/// Highest mode order (exclusive) is capped by the page grid.
pub fn validate_max_order(max_order: u32) -> Result<u32, ConfigError> {
    if max_order == 0 || max_order > GRID_SIZE {
        return Err(ConfigError::MaxOrder {
            got: max_order,
            max: GRID_SIZE,
        });
    }
    Ok(max_order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(BeamConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_beams() {
        let beam = BeamConfig {
            points: 1,
            ..BeamConfig::default()
        };
        assert!(matches!(beam.validate(), Err(ConfigError::GridPoints(1))));

        let beam = BeamConfig {
            wavelength: 0.0,
            ..BeamConfig::default()
        };
        assert!(matches!(
            beam.validate(),
            Err(ConfigError::NonPositive { name: "wavelength", .. })
        ));

        let beam = BeamConfig {
            z: f64::NAN,
            ..BeamConfig::default()
        };
        assert!(matches!(beam.validate(), Err(ConfigError::NotFinite { name: "z", .. })));
    }

    #[test]
    fn max_order_bounded_by_grid() {
        assert_eq!(validate_max_order(10).ok(), Some(10));
        assert!(validate_max_order(0).is_err());
        assert!(validate_max_order(11).is_err());
    }
}
