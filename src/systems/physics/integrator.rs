use serde::{Deserialize, Serialize};

use crate::components::{AeroForces, SimState, ThrustCommand};
use crate::resources::PhysicalParams;

use super::dynamics::state_derivative;

/// Fixed-step explicit integration scheme for the rigid-body equations.
/// The two schemes are interchangeable behind [`advance`]; which one runs
/// is a configuration choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrationScheme {
    Euler,
    RungeKutta4,
}

/// Advance the state by one step. Thrust and aerodynamic loads are held
/// constant over the step: for RK4 the intermediate stages re-evaluate the
/// derivative at stage states but with the same frozen inputs.
pub fn advance(
    scheme: IntegrationScheme,
    state: &SimState,
    thrust: &ThrustCommand,
    forces: &AeroForces,
    effective_alpha: f64,
    params: &PhysicalParams,
    dt: f64,
) -> SimState {
    match scheme {
        IntegrationScheme::Euler => {
            let k1 = state_derivative(state, thrust, forces, effective_alpha, params);
            state.add_scaled(&k1, dt)
        }
        IntegrationScheme::RungeKutta4 => {
            let k1 = state_derivative(state, thrust, forces, effective_alpha, params);
            let s2 = state.add_scaled(&k1, dt / 2.0);
            let k2 = state_derivative(&s2, thrust, forces, effective_alpha, params);
            let s3 = state.add_scaled(&k2, dt / 2.0);
            let k3 = state_derivative(&s3, thrust, forces, effective_alpha, params);
            let s4 = state.add_scaled(&k3, dt);
            let k4 = state_derivative(&s4, thrust, forces, effective_alpha, params);

            // Weighted average of the four stage derivatives.
            let mut next = *state;
            next = next.add_scaled(&k1, dt / 6.0);
            next = next.add_scaled(&k2, dt / 3.0);
            next = next.add_scaled(&k3, dt / 3.0);
            next = next.add_scaled(&k4, dt / 6.0);
            next
        }
    }
}
