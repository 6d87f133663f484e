mod aero;
mod state;
pub mod trim;

pub use aero::{AeroForces, AirflowData};
pub use state::{ReferenceSample, SimState, StateDerivative, ThrustCommand};
pub use trim::{TrimCondition, TrimResiduals, TrimResult, TrimSettings, TrimSolution};
