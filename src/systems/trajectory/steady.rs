use std::f64::consts::FRAC_PI_2;

use crate::components::trim::TrimSolver;
use crate::components::{ReferenceSample, SimState, TrimCondition};
use crate::utils::SimError;

use super::ManeuverPlan;

fn cruise_reference(samples: usize, dt: f64, speed: f64) -> Vec<ReferenceSample> {
    (0..samples)
        .map(|i| ReferenceSample {
            y: speed * i as f64 * dt,
            y_dot: speed,
            ..Default::default()
        })
        .collect()
}

/// Constant-velocity straight line at the trim condition; the run starts
/// exactly on the reference.
pub fn trim_cruise(
    samples: usize,
    dt: f64,
    cruise_speed: f64,
    solver: &TrimSolver,
) -> Result<ManeuverPlan, SimError> {
    let trim = solver.solve(TrimCondition::ForwardFlight {
        airspeed: cruise_speed,
    })?;

    let initial_state = SimState {
        theta: trim.solution.theta,
        y_dot: cruise_speed,
        ..Default::default()
    };

    Ok(ManeuverPlan {
        reference: cruise_reference(samples, dt, cruise_speed),
        initial_state,
        initial_thrust: trim.solution.thrust(),
        trim,
    })
}

/// Hover hold with an offset applied to the initial condition only. The
/// reference stays pinned at the origin; the offset is what excites the
/// closed loop.
pub fn hover_probe(
    samples: usize,
    solver: &TrimSolver,
    offset: impl FnOnce(&mut SimState),
) -> Result<ManeuverPlan, SimError> {
    let trim = solver.solve(TrimCondition::Hover)?;

    let mut initial_state = SimState {
        theta: FRAC_PI_2,
        ..Default::default()
    };
    offset(&mut initial_state);

    Ok(ManeuverPlan {
        reference: vec![ReferenceSample::default(); samples],
        initial_state,
        initial_thrust: trim.solution.thrust(),
        trim,
    })
}

/// Trim cruise with the initial pitch knocked off the equilibrium value.
pub fn pitch_probe_in_cruise(
    samples: usize,
    dt: f64,
    cruise_speed: f64,
    magnitude: f64,
    solver: &TrimSolver,
) -> Result<ManeuverPlan, SimError> {
    let mut plan = trim_cruise(samples, dt, cruise_speed, solver)?;
    plan.initial_state.theta += magnitude;
    Ok(plan)
}
