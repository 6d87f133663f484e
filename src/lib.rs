pub mod components;
pub mod resources;
pub mod systems;
pub mod utils;

pub use components::trim::{
    LeastSquaresFinder, RootFinder, RootSolution, TrimSolver,
};
pub use components::{
    AeroForces, AirflowData, ReferenceSample, SimState, ThrustCommand, TrimCondition,
    TrimResiduals, TrimResult, TrimSettings, TrimSolution,
};
pub use resources::{PhysicalParams, SimConfig};
pub use systems::aerodynamics::{AeroCoefficients, CoefficientSet, CubicSpline, PolarSample, PolarTable};
pub use systems::control::ControllerGains;
pub use systems::physics::IntegrationScheme;
pub use systems::simulation::{SimOutput, Simulation, StepRecord};
pub use systems::trajectory::{AlphaProfile, Maneuver, ManeuverPlan};
pub use utils::SimError;
