use serde::{Deserialize, Serialize};

use crate::components::{ReferenceSample, SimState, ThrustCommand, TrimResult};
use crate::components::trim::TrimSolver;
use crate::resources::PhysicalParams;
use crate::systems::aerodynamics::AeroCoefficients;
use crate::utils::SimError;

mod alpha_profile;
mod ramp;
mod steady;
mod waypoint;

/// Shape of the angle-of-attack profile flown during a prescribed
/// angle-of-attack transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AlphaProfile {
    /// Quadratic decay from hover pitch to the terminal angle.
    Parabolic,
    /// First-order exponential decay with the given rate [1/s].
    Exponential { rate: f64 },
}

/// The closed set of supported maneuvers. Planning dispatches exhaustively
/// over this enum; an unrecognized tag already fails at deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Maneuver {
    /// Smooth path through 2-D waypoints flown at constant speed.
    WaypointSpline { waypoints: Vec<[f64; 2]>, speed: f64 },
    /// Straight, level flight at the trim condition.
    TrimCruise,
    /// Hover to cruise: constant acceleration, then a settling buffer at
    /// constant speed.
    AccelRamp { accel: f64, buffer: f64 },
    /// Cruise to hover: constant deceleration, then a settling buffer at
    /// rest.
    DecelRamp { decel: f64, buffer: f64 },
    /// Transition flown by prescribing the angle-of-attack history; the
    /// terminal angle carries `lift_weight_ratio` of the weight at cruise
    /// speed.
    PrescribedAlpha {
        shape: AlphaProfile,
        duration: f64,
        lift_weight_ratio: f64,
    },
    /// Hover hold with the initial position offset by `magnitude` [m].
    StepPosition { magnitude: f64 },
    /// Hover hold with the initial pitch offset by `magnitude` [rad].
    StepPitch { magnitude: f64 },
    /// Hover hold with the initial airspeed offset by `magnitude` [m/s].
    StepAirspeed { magnitude: f64 },
    /// Trim cruise with the initial pitch offset by `magnitude` [rad].
    StepPitchForwardFlight { magnitude: f64 },
}

impl Maneuver {
    pub fn validate(&self, cruise_speed: f64) -> Result<(), SimError> {
        match self {
            Maneuver::WaypointSpline { waypoints, speed } => {
                if waypoints.len() < 2 {
                    return Err(SimError::InvalidConfig(format!(
                        "waypoint spline needs at least 2 waypoints, got {}",
                        waypoints.len()
                    )));
                }
                if waypoints
                    .windows(2)
                    .any(|w| w[0][0] == w[1][0] && w[0][1] == w[1][1])
                {
                    return Err(SimError::InvalidConfig(
                        "consecutive waypoints must be distinct".to_string(),
                    ));
                }
                if !(*speed > 0.0) {
                    return Err(SimError::InvalidConfig(format!(
                        "waypoint speed must be positive, got {speed}"
                    )));
                }
            }
            Maneuver::TrimCruise | Maneuver::StepPitchForwardFlight { .. } => {
                if !(cruise_speed > 0.0) {
                    return Err(SimError::InvalidConfig(
                        "forward-flight maneuvers need a positive cruise speed".to_string(),
                    ));
                }
            }
            Maneuver::AccelRamp { accel: rate, buffer }
            | Maneuver::DecelRamp { decel: rate, buffer } => {
                if !(*rate > 0.0) {
                    return Err(SimError::InvalidConfig(format!(
                        "ramp rate must be positive, got {rate}"
                    )));
                }
                if !(*buffer >= 0.0) {
                    return Err(SimError::InvalidConfig(format!(
                        "settling buffer must be non-negative, got {buffer}"
                    )));
                }
                if !(cruise_speed > 0.0) {
                    return Err(SimError::InvalidConfig(
                        "ramps need a positive cruise speed".to_string(),
                    ));
                }
            }
            Maneuver::PrescribedAlpha {
                shape,
                duration,
                lift_weight_ratio,
            } => {
                if !(*duration > 0.0) {
                    return Err(SimError::InvalidConfig(format!(
                        "transition duration must be positive, got {duration}"
                    )));
                }
                if !(*lift_weight_ratio > 0.0) {
                    return Err(SimError::InvalidConfig(format!(
                        "lift/weight ratio must be positive, got {lift_weight_ratio}"
                    )));
                }
                if let AlphaProfile::Exponential { rate } = shape {
                    if !(*rate > 0.0) {
                        return Err(SimError::InvalidConfig(format!(
                            "exponential decay rate must be positive, got {rate}"
                        )));
                    }
                }
                if !(cruise_speed > 0.0) {
                    return Err(SimError::InvalidConfig(
                        "transitions need a positive cruise speed".to_string(),
                    ));
                }
            }
            Maneuver::StepPosition { magnitude }
            | Maneuver::StepPitch { magnitude }
            | Maneuver::StepAirspeed { magnitude } => {
                if !magnitude.is_finite() {
                    return Err(SimError::InvalidConfig(
                        "step magnitude must be finite".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Time at which the maneuver reaches its terminal condition; `None`
    /// for maneuvers that hold indefinitely. Beyond this time the
    /// reference freezes.
    pub fn natural_duration(&self, cruise_speed: f64) -> Option<f64> {
        match self {
            Maneuver::WaypointSpline { waypoints, speed } => {
                Some(waypoint::path_length(waypoints) / speed)
            }
            Maneuver::AccelRamp { accel, buffer } => Some(cruise_speed / accel + buffer),
            Maneuver::DecelRamp { decel, buffer } => Some(cruise_speed / decel + buffer),
            Maneuver::PrescribedAlpha { duration, .. } => Some(*duration),
            Maneuver::TrimCruise
            | Maneuver::StepPosition { .. }
            | Maneuver::StepPitch { .. }
            | Maneuver::StepAirspeed { .. }
            | Maneuver::StepPitchForwardFlight { .. } => None,
        }
    }
}

/// Reference trajectory plus the initial condition it starts from.
#[derive(Debug, Clone)]
pub struct ManeuverPlan {
    pub reference: Vec<ReferenceSample>,
    pub initial_state: SimState,
    pub initial_thrust: ThrustCommand,
    /// Trim solution the plan's boundary conditions are seeded from.
    pub trim: TrimResult,
}

/// Build the reference trajectory for the configured maneuver on an
/// `samples`-point grid with spacing `dt`.
pub fn plan_maneuver(
    maneuver: &Maneuver,
    samples: usize,
    dt: f64,
    cruise_speed: f64,
    params: &PhysicalParams,
    coeffs: &AeroCoefficients,
    solver: &TrimSolver,
) -> Result<ManeuverPlan, SimError> {
    match maneuver {
        Maneuver::WaypointSpline { waypoints, speed } => {
            waypoint::plan(samples, dt, waypoints, *speed, solver)
        }
        Maneuver::TrimCruise => steady::trim_cruise(samples, dt, cruise_speed, solver),
        Maneuver::AccelRamp { accel, .. } => {
            ramp::accelerate(samples, dt, *accel, cruise_speed, solver)
        }
        Maneuver::DecelRamp { decel, .. } => {
            ramp::decelerate(samples, dt, *decel, cruise_speed, solver)
        }
        Maneuver::PrescribedAlpha {
            shape,
            duration,
            lift_weight_ratio,
        } => alpha_profile::plan(
            samples,
            dt,
            *shape,
            *duration,
            *lift_weight_ratio,
            cruise_speed,
            params,
            coeffs,
            solver,
        ),
        Maneuver::StepPosition { magnitude } => {
            steady::hover_probe(samples, solver, |state| state.y += magnitude)
        }
        Maneuver::StepPitch { magnitude } => {
            steady::hover_probe(samples, solver, |state| state.theta += magnitude)
        }
        Maneuver::StepAirspeed { magnitude } => {
            steady::hover_probe(samples, solver, |state| state.y_dot += magnitude)
        }
        Maneuver::StepPitchForwardFlight { magnitude } => {
            steady::pitch_probe_in_cruise(samples, dt, cruise_speed, *magnitude, solver)
        }
    }
}
