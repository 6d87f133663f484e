use crate::components::trim::TrimSolver;
use crate::components::{ReferenceSample, SimState, TrimCondition};
use crate::utils::SimError;

use super::ManeuverPlan;

/// Hover to cruise: constant acceleration until the target speed, then a
/// constant-velocity hold. The position reference is the closed-form
/// integral of the acceleration profile.
pub fn accelerate(
    samples: usize,
    dt: f64,
    accel: f64,
    target_speed: f64,
    solver: &TrimSolver,
) -> Result<ManeuverPlan, SimError> {
    let trim = solver.solve(TrimCondition::Hover)?;
    let t_ramp = target_speed / accel;

    let reference = (0..samples)
        .map(|i| {
            let t = i as f64 * dt;
            if t <= t_ramp {
                ReferenceSample {
                    y: 0.5 * accel * t * t,
                    y_dot: accel * t,
                    y_ddot: accel,
                    ..Default::default()
                }
            } else {
                // Velocity frozen at the target once the ramp completes.
                ReferenceSample {
                    y: 0.5 * accel * t_ramp * t_ramp + target_speed * (t - t_ramp),
                    y_dot: target_speed,
                    ..Default::default()
                }
            }
        })
        .collect();

    let initial_state = SimState {
        theta: trim.solution.theta,
        ..Default::default()
    };

    Ok(ManeuverPlan {
        reference,
        initial_state,
        initial_thrust: trim.solution.thrust(),
        trim,
    })
}

/// Cruise to hover: constant deceleration from the trim condition down to
/// rest, after which the position freezes at the stopping point.
pub fn decelerate(
    samples: usize,
    dt: f64,
    decel: f64,
    cruise_speed: f64,
    solver: &TrimSolver,
) -> Result<ManeuverPlan, SimError> {
    let trim = solver.solve(TrimCondition::ForwardFlight {
        airspeed: cruise_speed,
    })?;
    let t_ramp = cruise_speed / decel;
    let stop_distance = 0.5 * cruise_speed * cruise_speed / decel;

    let reference = (0..samples)
        .map(|i| {
            let t = i as f64 * dt;
            if t <= t_ramp {
                ReferenceSample {
                    y: cruise_speed * t - 0.5 * decel * t * t,
                    y_dot: cruise_speed - decel * t,
                    y_ddot: -decel,
                    ..Default::default()
                }
            } else {
                ReferenceSample {
                    y: stop_distance,
                    ..Default::default()
                }
            }
        })
        .collect();

    let initial_state = SimState {
        theta: trim.solution.theta,
        y_dot: cruise_speed,
        ..Default::default()
    };

    Ok(ManeuverPlan {
        reference,
        initial_state,
        initial_thrust: trim.solution.thrust(),
        trim,
    })
}
