mod dynamics;
mod integrator;

pub use dynamics::state_derivative;
pub use integrator::{advance, IntegrationScheme};
