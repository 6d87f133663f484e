use crate::components::trim::TrimSolver;
use crate::components::{ReferenceSample, SimState, TrimCondition};
use crate::systems::aerodynamics::CubicSpline;
use crate::utils::SimError;

use super::ManeuverPlan;

/// Total chordal length of the waypoint polyline. The splines below are
/// parameterized by this chordal distance, which stands in for arc length
/// at the fidelity a reference trajectory needs.
pub fn path_length(waypoints: &[[f64; 2]]) -> f64 {
    waypoints
        .windows(2)
        .map(|w| ((w[1][0] - w[0][0]).powi(2) + (w[1][1] - w[0][1]).powi(2)).sqrt())
        .sum()
}

fn chordal_knots(waypoints: &[[f64; 2]]) -> Vec<f64> {
    let mut knots = Vec::with_capacity(waypoints.len());
    let mut s = 0.0;
    knots.push(0.0);
    for w in waypoints.windows(2) {
        s += ((w[1][0] - w[0][0]).powi(2) + (w[1][1] - w[0][1]).powi(2)).sqrt();
        knots.push(s);
    }
    knots
}

/// Constant-speed flight along a smooth curve through the waypoints.
///
/// Two natural cubic splines, `y(s)` and `z(s)` over the chordal
/// parameter, carry the path; the reference runs the parameter at the
/// requested speed and ends frozen on the final waypoint.
pub fn plan(
    samples: usize,
    dt: f64,
    waypoints: &[[f64; 2]],
    speed: f64,
    solver: &TrimSolver,
) -> Result<ManeuverPlan, SimError> {
    // A two-point path is a straight segment; give the spline the interior
    // knot it needs.
    let filled;
    let waypoints = if waypoints.len() == 2 {
        let mid = [
            0.5 * (waypoints[0][0] + waypoints[1][0]),
            0.5 * (waypoints[0][1] + waypoints[1][1]),
        ];
        filled = vec![waypoints[0], mid, waypoints[1]];
        &filled[..]
    } else {
        waypoints
    };

    let knots = chordal_knots(waypoints);
    let s_end = *knots.last().expect("waypoint list is non-empty");

    let spline_y = CubicSpline::natural(
        knots.clone(),
        waypoints.iter().map(|w| w[0]).collect(),
    )?;
    let spline_z = CubicSpline::natural(knots, waypoints.iter().map(|w| w[1]).collect())?;

    let reference = (0..samples)
        .map(|i| {
            let s = (speed * i as f64 * dt).min(s_end);
            if s < s_end {
                ReferenceSample {
                    y: spline_y.evaluate(s),
                    z: spline_z.evaluate(s),
                    y_dot: spline_y.derivative(s) * speed,
                    z_dot: spline_z.derivative(s) * speed,
                    y_ddot: spline_y.second_derivative(s) * speed * speed,
                    z_ddot: spline_z.second_derivative(s) * speed * speed,
                }
            } else {
                // Past the last waypoint: position frozen on it.
                ReferenceSample {
                    y: spline_y.evaluate(s_end),
                    z: spline_z.evaluate(s_end),
                    ..Default::default()
                }
            }
        })
        .collect::<Vec<_>>();

    let trim = solver.solve(TrimCondition::ForwardFlight { airspeed: speed })?;

    // Start on the first waypoint, moving along the initial tangent, with
    // the pitch trimmed relative to the initial path direction.
    let tangent_y = spline_y.derivative(0.0);
    let tangent_z = spline_z.derivative(0.0);
    let gamma0 = tangent_z.atan2(tangent_y);
    let initial_state = SimState {
        y: waypoints[0][0],
        z: waypoints[0][1],
        theta: trim.solution.theta + gamma0,
        y_dot: tangent_y * speed,
        z_dot: tangent_z * speed,
        ..Default::default()
    };

    Ok(ManeuverPlan {
        reference,
        initial_state,
        initial_thrust: trim.solution.thrust(),
        trim,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::TrimSettings;
    use crate::resources::PhysicalParams;
    use crate::systems::aerodynamics::{AeroCoefficients, PolarTable};
    use approx::assert_relative_eq;

    fn fixture() -> (AeroCoefficients, PhysicalParams) {
        (
            AeroCoefficients::from_table(&PolarTable::flat_plate()).unwrap(),
            PhysicalParams::qbit(),
        )
    }

    #[test]
    fn spline_path_reproduces_start_and_end_waypoints() {
        let (coeffs, params) = fixture();
        let solver = TrimSolver::new(&coeffs, params, TrimSettings::default());

        let waypoints = vec![[0.0, 0.0], [60.0, 5.0], [140.0, -3.0], [200.0, 0.0]];
        let speed = 20.0;
        let length = path_length(&waypoints);
        let duration = length / speed;
        assert!(duration > 0.0);

        let dt = 0.01;
        let samples = (duration / dt).ceil() as usize + 200;
        let plan = super::plan(samples, dt, &waypoints, speed, &solver).unwrap();

        // Round trip: the path starts on the first waypoint and ends
        // frozen on the last.
        assert_relative_eq!(plan.reference[0].y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(plan.reference[0].z, 0.0, epsilon = 1e-9);
        let last = plan.reference.last().unwrap();
        assert_relative_eq!(last.y, 200.0, epsilon = 1e-9);
        assert_relative_eq!(last.z, 0.0, epsilon = 1e-9);

        // The final in-path derivative is finite.
        let end_index = (duration / dt).floor() as usize;
        let near_end = &plan.reference[end_index.saturating_sub(1)];
        assert!(near_end.y_dot.is_finite());
        assert!(near_end.z_dot.is_finite());

        // Reference speed matches the requested speed to chordal accuracy.
        let mid = &plan.reference[plan.reference.len() / 4];
        let ref_speed = (mid.y_dot.powi(2) + mid.z_dot.powi(2)).sqrt();
        assert_relative_eq!(ref_speed, speed, epsilon = 0.05 * speed);
    }

    #[test]
    fn two_waypoints_give_a_straight_line() {
        let (coeffs, params) = fixture();
        let solver = TrimSolver::new(&coeffs, params, TrimSettings::default());

        let waypoints = vec![[0.0, 0.0], [100.0, 0.0]];
        let plan = super::plan(300, 0.01, &waypoints, 20.0, &solver).unwrap();

        for sample in &plan.reference[..250] {
            assert_relative_eq!(sample.z, 0.0, epsilon = 1e-9);
            assert_relative_eq!(sample.y_dot, 20.0, epsilon = 1e-6);
        }
        assert_relative_eq!(plan.initial_state.y_dot, 20.0, epsilon = 1e-9);
    }
}
