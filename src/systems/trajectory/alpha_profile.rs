use std::f64::consts::FRAC_PI_2;

use crate::components::trim::TrimSolver;
use crate::components::{ReferenceSample, SimState, TrimCondition};
use crate::resources::PhysicalParams;
use crate::systems::aerodynamics::AeroCoefficients;
use crate::utils::math::rad_to_deg;
use crate::utils::SimError;

use super::{AlphaProfile, ManeuverPlan};

// Floor on sin(theta) when back-solving the altitude-hold thrust; near
// the end of the transition the wing carries the weight and the division
// would otherwise blow up.
const MIN_SIN_THETA: f64 = 0.05;

/// Transition flown on a prescribed angle-of-attack history.
///
/// The terminal angle comes from the scalar trim solve: it is the angle at
/// which the wing carries `lift_weight_ratio` of the weight at cruise
/// speed. The angle profile decays from hover pitch to that angle, and the
/// translational reference is forward-integrated under a level-flight
/// approximation: thrust along the body axis makes up whatever lift does
/// not yet carry, and the horizontal residual of thrust and drag is the
/// reference acceleration.
#[allow(clippy::too_many_arguments)]
pub fn plan(
    samples: usize,
    dt: f64,
    shape: AlphaProfile,
    duration: f64,
    lift_weight_ratio: f64,
    cruise_speed: f64,
    params: &PhysicalParams,
    coeffs: &AeroCoefficients,
    solver: &TrimSolver,
) -> Result<ManeuverPlan, SimError> {
    let trim = solver.solve(TrimCondition::Hover)?;
    let alpha_terminal = solver.solve_terminal_alpha(cruise_speed, lift_weight_ratio)?;

    let alpha_at = |t: f64| -> f64 {
        let swing = FRAC_PI_2 - alpha_terminal;
        match shape {
            AlphaProfile::Parabolic => {
                if t < duration {
                    let remaining = 1.0 - t / duration;
                    alpha_terminal + swing * remaining * remaining
                } else {
                    alpha_terminal
                }
            }
            AlphaProfile::Exponential { rate } => alpha_terminal + swing * (-rate * t).exp(),
        }
    };

    let weight = params.weight();
    let area = params.wing_area();

    let mut reference = Vec::with_capacity(samples);
    let mut y = 0.0;
    let mut speed: f64 = 0.0;
    for i in 0..samples {
        let t = i as f64 * dt;
        let alpha = alpha_at(t);

        let set = coeffs.evaluate(rad_to_deg(alpha));
        let dynamic_pressure = 0.5 * params.air_density * speed * speed;
        let lift = dynamic_pressure * area * set.cl;
        let drag = dynamic_pressure * area * set.cd;

        // Level transition: gamma = 0, so the pitch equals the prescribed
        // angle of attack and the vertical balance fixes the thrust.
        let thrust = ((weight - lift) / alpha.sin().max(MIN_SIN_THETA)).max(0.0);
        let accel = (thrust * alpha.cos() - drag) / params.mass;

        reference.push(ReferenceSample {
            y,
            y_dot: speed,
            y_ddot: accel,
            ..Default::default()
        });

        speed += accel * dt;
        y += speed * dt;
    }

    let initial_state = SimState {
        theta: FRAC_PI_2,
        ..Default::default()
    };

    Ok(ManeuverPlan {
        reference,
        initial_state,
        initial_thrust: trim.solution.thrust(),
        trim,
    })
}
