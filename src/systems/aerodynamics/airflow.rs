use crate::components::{AeroForces, AirflowData, SimState, ThrustCommand};
use crate::resources::PhysicalParams;
use crate::utils::math::rad_to_deg;

use super::polar::AeroCoefficients;

/// Below this speed the flight path angle (and with it the angle of
/// attack of the combined flow) is undefined and falls back to zero.
const MIN_AIRSPEED_THRESHOLD: f64 = 1e-10;

/// Momentum-theory slipstream speed at the wing for one thrust level.
///
/// The axial free-stream component and the thrust-induced term combine
/// under the square root; `wash_efficiency` scales how much of the
/// slipstream the wing actually sees.
fn wash_speed(axial_speed: f64, thrust: f64, params: &PhysicalParams) -> f64 {
    let induced = thrust / (0.5 * params.air_density * params.disk_area());
    params.wash_efficiency * (axial_speed * axial_speed + induced.max(0.0)).sqrt()
}

/// Derive the per-step airflow state and wing loads from the previous
/// step's vehicle state and thrust. Evaluating this *before* the new
/// thrust command is what gives the loop its one-step-delayed coupling
/// between control and aerodynamics.
///
/// # Arguments
/// * `state` - Vehicle state at the previous step.
/// * `thrust` - Thrust command applied over the previous step.
/// * `params` - Physical parameter set.
/// * `coeffs` - Polar interpolants, queried in degrees.
/// * `aero_enabled` - When false the wing is inert: the effective angle
///   of attack collapses to the geometric one and all loads are zero.
pub fn compute_airflow(
    state: &SimState,
    thrust: &ThrustCommand,
    params: &PhysicalParams,
    coeffs: &AeroCoefficients,
    aero_enabled: bool,
) -> (AirflowData, AeroForces) {
    let airspeed = state.speed();

    // Heading is undefined at rest; fall back to zero rather than letting
    // atan2(0, 0) pick an arbitrary branch.
    let gamma = if airspeed > MIN_AIRSPEED_THRESHOLD {
        state.z_dot.atan2(state.y_dot)
    } else {
        0.0
    };
    let alpha = state.theta - gamma;

    let axial = airspeed * alpha.cos();
    let wash = wash_speed(axial, thrust.mean(), params);
    let wash_top = wash_speed(axial, thrust.top, params);
    let wash_bottom = wash_speed(axial, thrust.bottom, params);

    // Law of cosines: free stream and wash meet at the angle of attack.
    let effective_airspeed =
        (airspeed * airspeed + wash * wash + 2.0 * airspeed * wash * alpha.cos()).sqrt();

    let effective_alpha = if !aero_enabled {
        alpha
    } else if effective_airspeed > MIN_AIRSPEED_THRESHOLD {
        // The ratio is bounded by 1 analytically; rounding can push it a
        // hair past and asin would return NaN.
        (airspeed * alpha.sin() / effective_airspeed)
            .clamp(-1.0, 1.0)
            .asin()
    } else {
        0.0
    };

    let airflow = AirflowData {
        airspeed,
        flight_path_angle: gamma,
        alpha,
        wash_speed: wash,
        wash_speed_top: wash_top,
        wash_speed_bottom: wash_bottom,
        effective_airspeed,
        effective_alpha,
    };

    let forces = if aero_enabled {
        let set = coeffs.evaluate(rad_to_deg(effective_alpha));
        let q_area = 0.5
            * params.air_density
            * effective_airspeed
            * effective_airspeed
            * params.wing_area();
        AeroForces {
            lift: q_area * set.cl,
            drag: q_area * set.cd,
            pitch_moment: q_area * params.chord * set.cm,
        }
    } else {
        AeroForces::zero()
    };

    (airflow, forces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::aerodynamics::polar::PolarTable;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn coeffs() -> AeroCoefficients {
        AeroCoefficients::from_table(&PolarTable::flat_plate()).unwrap()
    }

    fn hover_thrust(params: &PhysicalParams) -> ThrustCommand {
        ThrustCommand {
            top: params.weight() / 2.0,
            bottom: params.weight() / 2.0,
        }
    }

    #[test]
    fn speeds_are_never_negative() {
        let params = PhysicalParams::qbit();
        let coeffs = coeffs();

        let states = [
            SimState::default(),
            SimState {
                y_dot: -30.0,
                z_dot: 5.0,
                theta: 2.0,
                ..Default::default()
            },
            SimState {
                y_dot: 0.1,
                z_dot: -12.0,
                theta: -1.0,
                ..Default::default()
            },
        ];
        for state in &states {
            let (airflow, _) =
                compute_airflow(state, &hover_thrust(&params), &params, &coeffs, true);
            assert!(airflow.airspeed >= 0.0);
            assert!(airflow.wash_speed >= 0.0);
            assert!(airflow.wash_speed_top >= 0.0);
            assert!(airflow.wash_speed_bottom >= 0.0);
            assert!(airflow.effective_airspeed >= 0.0);
        }
    }

    #[test]
    fn rest_falls_back_to_zero_angles_for_any_pitch() {
        let params = PhysicalParams::qbit();
        let coeffs = coeffs();

        for theta in [0.0, FRAC_PI_2, 1.234, -2.5, PI] {
            let state = SimState {
                theta,
                ..Default::default()
            };
            let (airflow, _) =
                compute_airflow(&state, &hover_thrust(&params), &params, &coeffs, true);
            assert_eq!(airflow.flight_path_angle, 0.0);
            assert_eq!(airflow.effective_alpha, 0.0);
            assert_relative_eq!(airflow.alpha, theta);
        }
    }

    #[test]
    fn aligned_flow_adds_speeds_directly() {
        let params = PhysicalParams::qbit();
        let coeffs = coeffs();

        // Level flight with the nose on the velocity vector: alpha = 0 and
        // the law of cosines collapses to a plain sum.
        let state = SimState {
            theta: 0.0,
            y_dot: 20.0,
            ..Default::default()
        };
        let thrust = ThrustCommand {
            top: 2.0,
            bottom: 2.0,
        };
        let (airflow, _) = compute_airflow(&state, &thrust, &params, &coeffs, true);

        assert_relative_eq!(airflow.alpha, 0.0);
        assert_relative_eq!(
            airflow.effective_airspeed,
            airflow.airspeed + airflow.wash_speed,
            epsilon = 1e-9
        );
        assert_relative_eq!(airflow.effective_alpha, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn effective_alpha_is_smaller_than_geometric() {
        let params = PhysicalParams::qbit();
        let coeffs = coeffs();

        let state = SimState {
            theta: 0.3,
            y_dot: 15.0,
            ..Default::default()
        };
        let thrust = ThrustCommand {
            top: 3.0,
            bottom: 3.0,
        };
        let (airflow, _) = compute_airflow(&state, &thrust, &params, &coeffs, true);

        assert!(airflow.effective_alpha > 0.0);
        assert!(airflow.effective_alpha < airflow.alpha);
    }

    #[test]
    fn disabled_aerodynamics_zeroes_loads_and_keeps_geometric_alpha() {
        let params = PhysicalParams::qbit();
        let coeffs = coeffs();

        let state = SimState {
            theta: 0.8,
            y_dot: 10.0,
            z_dot: 1.0,
            ..Default::default()
        };
        let thrust = ThrustCommand {
            top: 4.0,
            bottom: 4.0,
        };
        let (airflow, forces) = compute_airflow(&state, &thrust, &params, &coeffs, false);

        assert_eq!(forces, AeroForces::zero());
        assert_relative_eq!(airflow.effective_alpha, airflow.alpha);
    }

    #[test]
    fn hover_wash_matches_momentum_theory() {
        let params = PhysicalParams::qbit();
        let coeffs = coeffs();

        let thrust = hover_thrust(&params);
        let state = SimState {
            theta: FRAC_PI_2,
            ..Default::default()
        };
        let (airflow, _) = compute_airflow(&state, &thrust, &params, &coeffs, true);

        let expected =
            (thrust.mean() / (0.5 * params.air_density * params.disk_area())).sqrt();
        assert_relative_eq!(airflow.wash_speed, expected, epsilon = 1e-12);
        assert_relative_eq!(airflow.effective_airspeed, expected, epsilon = 1e-12);
    }
}
