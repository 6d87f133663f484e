mod airflow;
pub mod polar;

pub use airflow::compute_airflow;
pub use polar::{AeroCoefficients, CoefficientSet, CubicSpline, PolarSample, PolarTable};
