use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::components::{AeroForces, AirflowData, ReferenceSample, SimState, ThrustCommand};
use crate::resources::PhysicalParams;

/// Gains of the tracking controller. Outer translational loop is a PD on
/// position/velocity error; inner attitude loop is a PD on pitch. The
/// attitude loop must stay several times faster than the outer loop for
/// the thrust-vector inversion to hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerGains {
    pub kp_pos: f64,
    pub kv_vel: f64,
    pub kp_att: f64,
    pub kd_att: f64,
}

impl Default for ControllerGains {
    fn default() -> Self {
        Self {
            kp_pos: 4.0,
            kv_vel: 4.0,
            kp_att: 80.0,
            kd_att: 18.0,
        }
    }
}

/// Output of one controller evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ControlOutput {
    pub thrust: ThrustCommand,
    /// Net force the thrust vector is asked to produce, inertial frame.
    pub force_des: Vector2<f64>,
    /// Commanded translational acceleration before force inversion.
    pub accel_des: Vector2<f64>,
}

/// Aerodynamic force resolved into inertial axes. The flow met by the
/// wing sits at `theta - effective_alpha`; drag points down-flow, lift
/// perpendicular to it.
fn aero_force_inertial(state: &SimState, airflow: &AirflowData, forces: &AeroForces) -> Vector2<f64> {
    let flow_angle = state.theta - airflow.effective_alpha;
    Vector2::new(
        -forces.drag * flow_angle.cos() - forces.lift * flow_angle.sin(),
        -forces.drag * flow_angle.sin() + forces.lift * flow_angle.cos(),
    )
}

/// Feedback-linearizing tracking controller.
///
/// Builds a commanded acceleration from the tracking error plus reference
/// feed-forward, inverts the known force balance to find the thrust vector
/// that realizes it (gravity and the current aerodynamic force are
/// subtracted out), and splits the total thrust across the two rotors so
/// the differential drives pitch toward the thrust-vector direction.
///
/// Stateless by design: every output is a pure function of the inputs, so
/// the loop can call it each step with no hidden accumulators.
pub fn control(
    state: &SimState,
    reference: &ReferenceSample,
    airflow: &AirflowData,
    forces: &AeroForces,
    params: &PhysicalParams,
    gains: &ControllerGains,
) -> ControlOutput {
    let pos_error = Vector2::new(reference.y - state.y, reference.z - state.z);
    let vel_error = Vector2::new(reference.y_dot - state.y_dot, reference.z_dot - state.z_dot);
    let feed_forward = Vector2::new(reference.y_ddot, reference.z_ddot);

    let accel_des = feed_forward + gains.kv_vel * vel_error + gains.kp_pos * pos_error;

    // Required thrust vector: m*a = F_thrust + F_gravity + F_aero.
    let gravity = Vector2::new(0.0, -params.weight());
    let force_des = params.mass * accel_des - gravity - aero_force_inertial(state, airflow, forces);

    let total_thrust = force_des.norm();
    let theta_des = force_des.y.atan2(force_des.x);

    // Pitch-moment balance: command the torque that steers theta onto the
    // thrust-vector direction, cancelling the aerodynamic moment.
    let moment_cmd = params.inertia
        * (gains.kp_att * (theta_des - state.theta) - gains.kd_att * state.theta_dot)
        - forces.pitch_moment;
    let differential = moment_cmd / params.arm_length;

    let thrust = ThrustCommand {
        top: 0.5 * total_thrust - 0.5 * differential,
        bottom: 0.5 * total_thrust + 0.5 * differential,
    };

    ControlOutput {
        thrust,
        force_des,
        accel_des,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn hover_state() -> SimState {
        SimState {
            theta: FRAC_PI_2,
            ..Default::default()
        }
    }

    #[test]
    fn hover_equilibrium_commands_weight_split_evenly() {
        let params = PhysicalParams::qbit();
        let gains = ControllerGains::default();

        // State exactly on a hover reference with no aero loads: the
        // controller should ask for weight, straight up, split evenly.
        let out = control(
            &hover_state(),
            &ReferenceSample::default(),
            &AirflowData::default(),
            &AeroForces::zero(),
            &params,
            &gains,
        );

        assert_relative_eq!(out.force_des.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(out.force_des.y, params.weight(), epsilon = 1e-12);
        assert_relative_eq!(out.thrust.total(), params.weight(), epsilon = 1e-9);
        assert_relative_eq!(out.thrust.top, out.thrust.bottom, epsilon = 1e-9);
    }

    #[test]
    fn position_error_tilts_the_thrust_vector() {
        let params = PhysicalParams::qbit();
        let gains = ControllerGains::default();

        let state = SimState {
            y: 1.0,
            ..hover_state()
        };
        let out = control(
            &state,
            &ReferenceSample::default(),
            &AirflowData::default(),
            &AeroForces::zero(),
            &params,
            &gains,
        );

        // Vehicle sits at +y of the reference: the commanded force leans
        // toward -y while still carrying the weight.
        assert!(out.force_des.x < 0.0);
        assert_relative_eq!(out.force_des.y, params.weight(), epsilon = 1e-12);
        // Thrust-vector direction is past vertical, so the differential
        // pitches the nose over.
        assert!(out.thrust.bottom > out.thrust.top);
    }

    #[test]
    fn aerodynamic_moment_is_cancelled_by_differential() {
        let params = PhysicalParams::qbit();
        let gains = ControllerGains::default();

        let forces = AeroForces {
            lift: 0.0,
            drag: 0.0,
            pitch_moment: 0.5,
        };
        let out = control(
            &hover_state(),
            &ReferenceSample::default(),
            &AirflowData::default(),
            &forces,
            &params,
            &gains,
        );

        assert_relative_eq!(
            params.arm_length * out.thrust.differential(),
            -0.5,
            epsilon = 1e-9
        );
    }

    #[test]
    fn outputs_are_finite_for_ordinary_inputs() {
        let params = PhysicalParams::qbit();
        let gains = ControllerGains::default();

        let state = SimState {
            y: -3.0,
            z: 12.0,
            theta: 0.2,
            y_dot: 18.0,
            z_dot: -2.0,
            theta_dot: 0.6,
        };
        let reference = ReferenceSample {
            y: 5.0,
            y_dot: 20.0,
            y_ddot: 1.5,
            ..Default::default()
        };
        let airflow = AirflowData {
            airspeed: 18.1,
            alpha: 0.15,
            effective_alpha: 0.07,
            effective_airspeed: 40.0,
            ..Default::default()
        };
        let forces = AeroForces {
            lift: 7.0,
            drag: 6.0,
            pitch_moment: -0.2,
        };

        let out = control(&state, &reference, &airflow, &forces, &params, &gains);
        assert!(out.thrust.top.is_finite());
        assert!(out.thrust.bottom.is_finite());
        assert!(out.force_des.iter().all(|v| v.is_finite()));
        assert!(out.accel_des.iter().all(|v| v.is_finite()));
    }
}
