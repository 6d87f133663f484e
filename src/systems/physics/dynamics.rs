use crate::components::{AeroForces, SimState, StateDerivative, ThrustCommand};
use crate::resources::PhysicalParams;

/// Closed-form rigid-body derivative for the planar tail-sitter.
///
/// Thrust acts along the body axis at pitch `theta`; lift and drag act
/// perpendicular and parallel to the combined airflow, whose direction
/// sits at `theta - effective_alpha` in the inertial frame. The
/// differential thrust torques the pitch axis through the rotor arm.
///
/// The loads and `effective_alpha` are whatever the airflow model produced
/// for this step; they are treated as frozen while the state varies, which
/// is what lets the integrator re-evaluate this function at intermediate
/// stage states.
pub fn state_derivative(
    state: &SimState,
    thrust: &ThrustCommand,
    forces: &AeroForces,
    effective_alpha: f64,
    params: &PhysicalParams,
) -> StateDerivative {
    let total = thrust.total();
    let flow_angle = state.theta - effective_alpha;

    let y_ddot = (total * state.theta.cos()
        - forces.drag * flow_angle.cos()
        - forces.lift * flow_angle.sin())
        / params.mass;

    let z_ddot = (-params.weight() + total * state.theta.sin()
        - forces.drag * flow_angle.sin()
        + forces.lift * flow_angle.cos())
        / params.mass;

    let theta_ddot = (forces.pitch_moment + params.arm_length * thrust.differential())
        / params.inertia;

    StateDerivative {
        y_dot: state.y_dot,
        z_dot: state.z_dot,
        theta_dot: state.theta_dot,
        y_ddot,
        z_ddot,
        theta_ddot,
    }
}
