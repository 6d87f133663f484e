use serde::{Deserialize, Serialize};

use crate::utils::SimError;

/// One row of measured airfoil polar data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarSample {
    /// Angle of attack in degrees.
    pub alpha_deg: f64,
    pub cl: f64,
    pub cd: f64,
    pub cm: f64,
}

/// Ordered table of polar samples. The storage format of the data is the
/// caller's concern; the simulation only ever sees the in-memory table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolarTable {
    pub samples: Vec<PolarSample>,
}

impl PolarTable {
    pub fn new(samples: Vec<PolarSample>) -> Self {
        Self { samples }
    }

    /// Symmetric flat-plate style polar spanning the full angle-of-attack
    /// circle: a linear lift slope of 0.1/deg up to stall near 13 deg,
    /// then flat-plate behaviour out to +-180 deg. Lift and moment are odd
    /// in alpha, drag is even.
    pub fn flat_plate() -> Self {
        // (alpha_deg, cl, cd, cm) for alpha >= 0; the negative half is
        // mirrored below.
        const POSITIVE_HALF: &[(f64, f64, f64, f64)] = &[
            (0.0, 0.000, 0.057, 0.000),
            (2.0, 0.200, 0.058, -0.004),
            (4.0, 0.400, 0.060, -0.008),
            (6.0, 0.600, 0.064, -0.012),
            (8.0, 0.800, 0.070, -0.016),
            (10.0, 1.000, 0.077, -0.020),
            (12.0, 1.180, 0.086, -0.024),
            (15.0, 1.100, 0.174, -0.060),
            (20.0, 0.820, 0.262, -0.110),
            (25.0, 0.805, 0.370, -0.160),
            (30.0, 0.909, 0.494, -0.210),
            (40.0, 1.034, 0.780, -0.285),
            (50.0, 1.034, 1.084, -0.340),
            (60.0, 0.909, 1.370, -0.385),
            (70.0, 0.675, 1.602, -0.415),
            (80.0, 0.359, 1.754, -0.435),
            (90.0, 0.000, 1.807, -0.445),
            (105.0, -0.525, 1.690, -0.430),
            (120.0, -0.909, 1.370, -0.385),
            (135.0, -1.050, 0.932, -0.315),
            (150.0, -0.909, 0.494, -0.222),
            (165.0, -0.525, 0.174, -0.115),
            (180.0, 0.000, 0.057, 0.000),
        ];

        let mut samples = Vec::with_capacity(2 * POSITIVE_HALF.len() - 1);
        for &(alpha, cl, cd, cm) in POSITIVE_HALF.iter().skip(1).rev() {
            samples.push(PolarSample {
                alpha_deg: -alpha,
                cl: -cl,
                cd,
                cm: -cm,
            });
        }
        for &(alpha, cl, cd, cm) in POSITIVE_HALF {
            samples.push(PolarSample {
                alpha_deg: alpha,
                cl,
                cd,
                cm,
            });
        }
        Self { samples }
    }
}

/// Natural cubic spline through a strictly increasing set of knots.
///
/// Outside the sampled domain the spline continues along its boundary
/// tangent, so evaluation is total and deterministic for any input.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    // Second derivatives at the knots; zero at both ends by the natural
    // boundary condition.
    m: Vec<f64>,
}

impl CubicSpline {
    pub fn natural(x: Vec<f64>, y: Vec<f64>) -> Result<Self, SimError> {
        if x.len() != y.len() {
            return Err(SimError::InvalidConfig(format!(
                "spline knot/value length mismatch: {} vs {}",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 3 {
            return Err(SimError::InvalidConfig(format!(
                "spline needs at least 3 knots, got {}",
                x.len()
            )));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SimError::InvalidConfig(
                "spline knots must be strictly increasing".to_string(),
            ));
        }

        let n = x.len();
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

        // Thomas algorithm on the interior tridiagonal system for the
        // knot second derivatives.
        let interior = n - 2;
        let mut c_prime = vec![0.0; interior];
        let mut d_prime = vec![0.0; interior];
        for k in 0..interior {
            let a = h[k];
            let b = 2.0 * (h[k] + h[k + 1]);
            let c = h[k + 1];
            let d = 6.0 * ((y[k + 2] - y[k + 1]) / h[k + 1] - (y[k + 1] - y[k]) / h[k]);
            if k == 0 {
                c_prime[k] = c / b;
                d_prime[k] = d / b;
            } else {
                let denom = b - a * c_prime[k - 1];
                c_prime[k] = c / denom;
                d_prime[k] = (d - a * d_prime[k - 1]) / denom;
            }
        }

        let mut m = vec![0.0; n];
        for k in (0..interior).rev() {
            m[k + 1] = d_prime[k] - c_prime[k] * m[k + 2];
        }

        Ok(Self { x, y, m })
    }

    fn interval(&self, x: f64) -> usize {
        let n = self.x.len();
        self.x
            .partition_point(|&knot| knot <= x)
            .saturating_sub(1)
            .min(n - 2)
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let (lo, hi) = self.domain();
        if x < lo {
            return self.y[0] + self.derivative(lo) * (x - lo);
        }
        if x > hi {
            let n = self.y.len();
            return self.y[n - 1] + self.derivative(hi) * (x - hi);
        }

        let i = self.interval(x);
        let h = self.x[i + 1] - self.x[i];
        let a = self.x[i + 1] - x;
        let b = x - self.x[i];
        self.m[i] * a * a * a / (6.0 * h)
            + self.m[i + 1] * b * b * b / (6.0 * h)
            + (self.y[i] / h - self.m[i] * h / 6.0) * a
            + (self.y[i + 1] / h - self.m[i + 1] * h / 6.0) * b
    }

    pub fn derivative(&self, x: f64) -> f64 {
        let (lo, hi) = self.domain();
        let x = x.clamp(lo, hi);

        let i = self.interval(x);
        let h = self.x[i + 1] - self.x[i];
        let a = self.x[i + 1] - x;
        let b = x - self.x[i];
        -self.m[i] * a * a / (2.0 * h)
            + self.m[i + 1] * b * b / (2.0 * h)
            + (self.y[i + 1] - self.y[i]) / h
            - (self.m[i + 1] - self.m[i]) * h / 6.0
    }

    pub fn second_derivative(&self, x: f64) -> f64 {
        let (lo, hi) = self.domain();
        if x < lo || x > hi {
            // The extrapolated region is linear.
            return 0.0;
        }
        let i = self.interval(x);
        let h = self.x[i + 1] - self.x[i];
        self.m[i] * (self.x[i + 1] - x) / h + self.m[i + 1] * (x - self.x[i]) / h
    }
}

/// Lift, drag and moment coefficient at one angle of attack.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoefficientSet {
    pub cl: f64,
    pub cd: f64,
    pub cm: f64,
}

/// Smooth interpolants over the polar table, one per coefficient channel.
/// Built once before the run and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct AeroCoefficients {
    lift: CubicSpline,
    drag: CubicSpline,
    moment: CubicSpline,
}

impl AeroCoefficients {
    pub fn from_table(table: &PolarTable) -> Result<Self, SimError> {
        let alpha: Vec<f64> = table.samples.iter().map(|s| s.alpha_deg).collect();
        let cl: Vec<f64> = table.samples.iter().map(|s| s.cl).collect();
        let cd: Vec<f64> = table.samples.iter().map(|s| s.cd).collect();
        let cm: Vec<f64> = table.samples.iter().map(|s| s.cm).collect();

        Ok(Self {
            lift: CubicSpline::natural(alpha.clone(), cl)?,
            drag: CubicSpline::natural(alpha.clone(), cd)?,
            moment: CubicSpline::natural(alpha, cm)?,
        })
    }

    /// Query all three channels at an angle of attack in degrees. Pure and
    /// total: angles beyond the table extrapolate linearly.
    pub fn evaluate(&self, alpha_deg: f64) -> CoefficientSet {
        CoefficientSet {
            cl: self.lift.evaluate(alpha_deg),
            cd: self.drag.evaluate(alpha_deg),
            cm: self.moment.evaluate(alpha_deg),
        }
    }
}
