use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::components::TrimSettings;
use crate::systems::aerodynamics::PolarSample;
use crate::systems::control::ControllerGains;
use crate::systems::physics::IntegrationScheme;
use crate::systems::trajectory::Maneuver;
use crate::utils::SimError;

use super::PhysicalParams;

/// Full configuration of one simulation run. Assembled before any work
/// starts; an invalid configuration never reaches the main loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed integration step [s].
    pub dt: f64,
    /// Simulated duration [s]; the grid has `duration / dt + 1` samples.
    pub duration: f64,
    pub scheme: IntegrationScheme,
    pub aero_enabled: bool,
    /// Target cruise airspeed used for trim and as the maneuver speed
    /// scale [m/s].
    pub cruise_speed: f64,
    pub params: PhysicalParams,
    pub maneuver: Maneuver,
    pub gains: ControllerGains,
    pub trim: TrimSettings,
    /// Polar table override; the built-in flat-plate table when absent.
    pub polar: Option<Vec<PolarSample>>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.01,
            duration: 5.0,
            scheme: IntegrationScheme::RungeKutta4,
            aero_enabled: true,
            cruise_speed: 25.0,
            params: PhysicalParams::qbit(),
            maneuver: Maneuver::TrimCruise,
            gains: ControllerGains::default(),
            trim: TrimSettings::default(),
            polar: None,
        }
    }
}

impl SimConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, SimError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Number of samples on the time grid, endpoints included.
    pub fn samples(&self) -> usize {
        (self.duration / self.dt).round() as usize + 1
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.dt > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "timestep must be positive, got {}",
                self.dt
            )));
        }
        if !(self.duration >= self.dt) {
            return Err(SimError::InvalidConfig(format!(
                "duration {} shorter than one timestep {}",
                self.duration, self.dt
            )));
        }
        if !(self.cruise_speed >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "cruise speed must be non-negative, got {}",
                self.cruise_speed
            )));
        }

        let p = &self.params;
        if !(p.mass > 0.0 && p.inertia > 0.0 && p.air_density > 0.0) {
            return Err(SimError::InvalidConfig(
                "mass, inertia and air density must be positive".to_string(),
            ));
        }
        if !(p.chord > 0.0 && p.span > 0.0 && p.prop_radius > 0.0 && p.arm_length > 0.0) {
            return Err(SimError::InvalidConfig(
                "geometry lengths must be positive".to_string(),
            ));
        }
        if !(p.wash_efficiency >= 0.0) {
            return Err(SimError::InvalidConfig(
                "wash efficiency must be non-negative".to_string(),
            ));
        }

        self.maneuver.validate(self.cruise_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn yaml_round_trip_preserves_the_config() {
        let mut config = SimConfig::default();
        config.dt = 0.02;
        config.scheme = IntegrationScheme::Euler;
        config.maneuver = Maneuver::StepPosition { magnitude: 0.5 };

        let text = serde_yaml::to_string(&config).unwrap();
        let parsed = SimConfig::from_yaml_str(&text).unwrap();

        assert_eq!(parsed.dt, config.dt);
        assert_eq!(parsed.scheme, config.scheme);
        assert_eq!(parsed.maneuver, config.maneuver);
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let config = SimConfig::from_yaml_str("maneuver: TrimCruise\ndt: 0.005\n").unwrap();
        assert_eq!(config.dt, 0.005);
        assert_eq!(config.duration, 5.0);
        assert_eq!(config.scheme, IntegrationScheme::RungeKutta4);
    }

    #[test]
    fn unknown_maneuver_tag_is_a_config_time_error() {
        let result = SimConfig::from_yaml_str("maneuver: BarrelRoll\n");
        assert!(matches!(result, Err(SimError::SerializationError(_))));
    }

    #[test]
    fn non_positive_timestep_is_rejected() {
        let mut config = SimConfig::default();
        config.dt = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_loads_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "duration: 2.0\ncruise_speed: 12.0\n").unwrap();

        let config = SimConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.duration, 2.0);
        assert_eq!(config.cruise_speed, 12.0);
    }
}
