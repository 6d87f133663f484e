use serde::{Deserialize, Serialize};

/// Configuration for the trim solver
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrimSettings {
    /// Maximum number of direct-search iterations
    pub max_iterations: u64,
    /// Convergence tolerance for the sum-of-squares cost
    pub cost_tolerance: f64,
    /// Whether to polish the direct-search result with Newton steps
    pub use_newton_refinement: bool,
    /// 0 = silent, 1 = new best points, 2 = every iteration
    pub debug_level: usize,
}

impl Default for TrimSettings {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            cost_tolerance: 1e-14,
            use_newton_refinement: true,
            debug_level: 0,
        }
    }
}
