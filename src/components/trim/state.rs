use serde::{Deserialize, Serialize};

use crate::components::ThrustCommand;

/// Flight condition the trim solver is asked to balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TrimCondition {
    /// Stationary hover, thrust axis vertical. Solved in closed form.
    Hover,
    /// Straight, level, constant-speed flight at the given airspeed.
    ForwardFlight { airspeed: f64 },
}

/// Equilibrium thrust pair and pitch attitude. Computed once per run and
/// read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimSolution {
    pub thrust_top: f64,
    pub thrust_bottom: f64,
    pub theta: f64,
}

impl TrimSolution {
    pub fn thrust(&self) -> ThrustCommand {
        ThrustCommand {
            top: self.thrust_top,
            bottom: self.thrust_bottom,
        }
    }

    pub fn total_thrust(&self) -> f64 {
        self.thrust_top + self.thrust_bottom
    }
}

/// Force and moment imbalance at a candidate trim point, in physical units
/// (Newtons, Newton-metres). All three vanish at equilibrium.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimResiduals {
    pub horizontal_force: f64,
    pub vertical_force: f64,
    pub pitch_moment: f64,
}

impl TrimResiduals {
    pub fn max_abs(&self) -> f64 {
        self.horizontal_force
            .abs()
            .max(self.vertical_force.abs())
            .max(self.pitch_moment.abs())
    }
}

/// Results from the trim calculation.
#[derive(Debug, Clone)]
pub struct TrimResult {
    pub solution: TrimSolution,
    pub converged: bool,
    pub cost: f64,
    pub iterations: u64,
    pub residuals: TrimResiduals,
}
