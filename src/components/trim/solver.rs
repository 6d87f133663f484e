use argmin::core::observers::ObserverMode;
use argmin::core::{CostFunction, Error, Executor};
use argmin::solver::neldermead::NelderMead;
use argmin_observer_slog::SlogLogger;
use nalgebra::{DMatrix, DVector};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::components::{SimState, TrimCondition, TrimResiduals, TrimResult, TrimSolution};
use crate::resources::PhysicalParams;
use crate::systems::aerodynamics::{compute_airflow, AeroCoefficients};
use crate::systems::physics::state_derivative;
use crate::utils::math::rad_to_deg;
use crate::utils::SimError;

use super::TrimSettings;

/// Outcome of a root-finding attempt.
#[derive(Debug, Clone)]
pub struct RootSolution {
    pub param: Vec<f64>,
    pub cost: f64,
    pub iterations: u64,
    pub converged: bool,
}

/// Narrow interface for the equilibrium root-finder: a residual function
/// and a seed go in, a solution with a convergence flag comes out. Any
/// Newton, Levenberg-Marquardt or direct-search implementation satisfies
/// the contract.
pub trait RootFinder {
    fn find_root<F>(&self, residual: F, seed: &[f64]) -> Result<RootSolution, SimError>
    where
        F: Fn(&[f64]) -> Vec<f64> + Sync;
}

/// Sum-of-squares reduction of a residual vector, the form the direct
/// search optimizer consumes.
struct SumOfSquares<'a, F> {
    residual: &'a F,
}

impl<'a, F> CostFunction for SumOfSquares<'a, F>
where
    F: Fn(&[f64]) -> Vec<f64> + Sync,
{
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, Error> {
        Ok((self.residual)(param).iter().map(|r| r * r).sum())
    }
}

fn sum_of_squares(residuals: &[f64]) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

/// Two-stage least-squares root finder: Nelder-Mead direct search from the
/// seed, then damped Newton steps on the square residual system with a
/// central finite-difference Jacobian.
#[derive(Debug, Clone, Copy)]
pub struct LeastSquaresFinder {
    pub settings: TrimSettings,
}

impl LeastSquaresFinder {
    pub fn new(settings: TrimSettings) -> Self {
        Self { settings }
    }

    fn direct_search<F>(&self, residual: &F, seed: &[f64]) -> Result<(Vec<f64>, f64, u64), SimError>
    where
        F: Fn(&[f64]) -> Vec<f64> + Sync,
    {
        let n = seed.len();
        let mut simplex = Vec::with_capacity(n + 1);
        simplex.push(seed.to_vec());
        for i in 0..n {
            let mut vertex = seed.to_vec();
            vertex[i] += 0.1 * vertex[i].abs().max(0.5);
            simplex.push(vertex);
        }

        let solver = NelderMead::new(simplex)
            .with_sd_tolerance(1e-12)
            .map_err(|e: Error| SimError::Solver(e.to_string()))?;

        let operator = SumOfSquares { residual };
        let mut executor = Executor::new(operator, solver).configure(|state| {
            state
                .max_iters(self.settings.max_iterations)
                .target_cost(self.settings.cost_tolerance)
        });
        executor = match self.settings.debug_level {
            0 => executor,
            1 => executor.add_observer(SlogLogger::term(), ObserverMode::NewBest),
            _ => executor.add_observer(SlogLogger::term(), ObserverMode::Always),
        };

        let result = executor
            .run()
            .map_err(|e| SimError::Solver(e.to_string()))?;

        let iterations = result.state.iter;
        let cost = result.state.best_cost;
        let param = result
            .state
            .best_param
            .clone()
            .unwrap_or_else(|| seed.to_vec());
        Ok((param, cost, iterations))
    }

    /// Damped Newton iteration on the residual system. The trim system is
    /// square (as many residuals as unknowns), so each step solves the
    /// finite-difference Jacobian directly.
    fn newton_refine<F>(&self, residual: &F, start: Vec<f64>, start_cost: f64) -> (Vec<f64>, f64, u64)
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        const MAX_NEWTON_ITERS: u64 = 50;
        const MAX_HALVINGS: u32 = 8;

        let n = start.len();
        let mut x = start;
        let mut cost = start_cost;
        let mut iterations = 0;

        while iterations < MAX_NEWTON_ITERS && cost >= self.settings.cost_tolerance {
            let r = residual(&x);
            if r.len() != n {
                break;
            }

            let mut jacobian = DMatrix::zeros(n, n);
            for j in 0..n {
                let h = 1e-6 * x[j].abs().max(1.0);
                let mut plus = x.clone();
                let mut minus = x.clone();
                plus[j] += h;
                minus[j] -= h;
                let r_plus = residual(&plus);
                let r_minus = residual(&minus);
                for i in 0..n {
                    jacobian[(i, j)] = (r_plus[i] - r_minus[i]) / (2.0 * h);
                }
            }

            let rhs = -DVector::from_column_slice(&r);
            let delta = match jacobian.lu().solve(&rhs) {
                Some(delta) => delta,
                None => break,
            };

            let mut step = 1.0;
            let mut improved = false;
            for _ in 0..MAX_HALVINGS {
                let trial: Vec<f64> = x
                    .iter()
                    .zip(delta.iter())
                    .map(|(xi, di)| xi + step * di)
                    .collect();
                let trial_cost = sum_of_squares(&residual(&trial));
                if trial_cost.is_finite() && trial_cost < cost {
                    x = trial;
                    cost = trial_cost;
                    improved = true;
                    break;
                }
                step *= 0.5;
            }
            iterations += 1;
            if !improved {
                break;
            }
        }

        (x, cost, iterations)
    }
}

impl RootFinder for LeastSquaresFinder {
    fn find_root<F>(&self, residual: F, seed: &[f64]) -> Result<RootSolution, SimError>
    where
        F: Fn(&[f64]) -> Vec<f64> + Sync,
    {
        let (param, cost, direct_iters) = self.direct_search(&residual, seed)?;

        let (param, cost, newton_iters) = if self.settings.use_newton_refinement {
            self.newton_refine(&residual, param, cost)
        } else {
            (param, cost, 0)
        };

        Ok(RootSolution {
            converged: cost < self.settings.cost_tolerance,
            param,
            cost,
            iterations: direct_iters + newton_iters,
        })
    }
}

/// Equilibrium solver for steady flight conditions.
///
/// The residual function is algebraically one evaluation of the dynamics
/// model at zero acceleration: reconstruct the airflow at the candidate
/// state, take the rigid-body derivative, and demand that the
/// accelerations vanish.
pub struct TrimSolver<'a> {
    coeffs: &'a AeroCoefficients,
    params: PhysicalParams,
    settings: TrimSettings,
}

impl<'a> TrimSolver<'a> {
    pub fn new(coeffs: &'a AeroCoefficients, params: PhysicalParams, settings: TrimSettings) -> Self {
        Self {
            coeffs,
            params,
            settings,
        }
    }

    /// Force/moment imbalance of a candidate solution in physical units
    /// (Newtons, Newton-metres) at the given airspeed.
    pub fn residuals(&self, solution: &TrimSolution, airspeed: f64) -> TrimResiduals {
        let state = SimState {
            theta: solution.theta,
            y_dot: airspeed,
            ..Default::default()
        };
        let thrust = solution.thrust();
        let (airflow, forces) =
            compute_airflow(&state, &thrust, &self.params, self.coeffs, true);
        let d = state_derivative(&state, &thrust, &forces, airflow.effective_alpha, &self.params);

        TrimResiduals {
            horizontal_force: d.y_ddot * self.params.mass,
            vertical_force: d.z_ddot * self.params.mass,
            pitch_moment: d.theta_ddot * self.params.inertia,
        }
    }

    /// Residuals normalized by the characteristic force `m g` and moment
    /// `m g l`, the scaling the optimizer works in.
    fn normalized_residuals(&self, param: &[f64], airspeed: f64) -> Vec<f64> {
        let solution = TrimSolution {
            thrust_top: param[0],
            thrust_bottom: param[1],
            theta: param[2],
        };
        let r = self.residuals(&solution, airspeed);
        let force_scale = self.params.weight();
        let moment_scale = self.params.weight() * self.params.arm_length;
        vec![
            r.horizontal_force / force_scale,
            r.vertical_force / force_scale,
            r.pitch_moment / moment_scale,
        ]
    }

    pub fn solve(&self, condition: TrimCondition) -> Result<TrimResult, SimError> {
        match condition {
            TrimCondition::Hover => Ok(self.hover_trim()),
            TrimCondition::ForwardFlight { airspeed } => self.forward_trim(airspeed),
        }
    }

    /// Hover equilibrium in closed form. At rest the wing sits in pure
    /// prop wash at zero effective angle of attack, so the wash drag is a
    /// download that scales linearly with thrust:
    /// `T = W / (1 - eta^2 S Cd0 / (2 pi R^2))`. The wash moment is
    /// likewise linear in thrust and cancelled by the differential.
    fn hover_trim(&self) -> TrimResult {
        let at_zero = self.coeffs.evaluate(0.0);
        let area_ratio = self.params.wing_area() / self.params.disk_area();
        let eta2 = self.params.wash_efficiency * self.params.wash_efficiency;

        let download_per_thrust = 0.5 * eta2 * area_ratio * at_zero.cd;
        let total = self.params.weight() / (1.0 - download_per_thrust).max(0.1);

        // Moment balance: M_air + l (T_bot - T_top) = 0, with M_air linear
        // in the mean thrust.
        let moment_per_thrust = 0.5 * eta2 * area_ratio * self.params.chord * at_zero.cm;
        let differential = -moment_per_thrust * total / self.params.arm_length;

        let solution = TrimSolution {
            thrust_top: 0.5 * (total - differential),
            thrust_bottom: 0.5 * (total + differential),
            theta: FRAC_PI_2,
        };
        let residuals = self.residuals(&solution, 0.0);
        let cost = sum_of_squares(&self.normalized_residuals(
            &[solution.thrust_top, solution.thrust_bottom, solution.theta],
            0.0,
        ));

        TrimResult {
            solution,
            converged: cost < self.settings.cost_tolerance.max(1e-12),
            cost,
            iterations: 0,
            residuals,
        }
    }

    fn forward_trim(&self, airspeed: f64) -> Result<TrimResult, SimError> {
        // Half-weight thrust split at 45 degrees pitch: a physically
        // reasonable seed anywhere between hover and fast cruise.
        let seed = [
            self.params.weight() / 2.0,
            self.params.weight() / 2.0,
            FRAC_PI_4,
        ];

        let finder = LeastSquaresFinder::new(self.settings);
        let solution = finder.find_root(
            |param: &[f64]| self.normalized_residuals(param, airspeed),
            &seed,
        )?;

        if !solution.converged {
            return Err(SimError::TrimNotFound {
                cost: solution.cost,
                iterations: solution.iterations,
            });
        }

        let trim = TrimSolution {
            thrust_top: solution.param[0],
            thrust_bottom: solution.param[1],
            theta: solution.param[2],
        };
        Ok(TrimResult {
            solution: trim,
            converged: true,
            cost: solution.cost,
            iterations: solution.iterations,
            residuals: self.residuals(&trim, airspeed),
        })
    }

    /// Scalar variant: the angle of attack at which the wing carries the
    /// requested fraction of the vehicle weight at the given airspeed.
    /// Sizes the terminal angle of a prescribed angle-of-attack transition.
    pub fn solve_terminal_alpha(
        &self,
        airspeed: f64,
        lift_weight_ratio: f64,
    ) -> Result<f64, SimError> {
        let dynamic_pressure = 0.5 * self.params.air_density * airspeed * airspeed;
        let area = self.params.wing_area();
        let weight = self.params.weight();

        let residual = |param: &[f64]| {
            let cl = self.coeffs.evaluate(rad_to_deg(param[0])).cl;
            vec![dynamic_pressure * area * cl / weight - lift_weight_ratio]
        };

        let finder = LeastSquaresFinder::new(self.settings);
        let solution = finder.find_root(residual, &[0.07])?;

        if !solution.converged {
            return Err(SimError::TrimNotFound {
                cost: solution.cost,
                iterations: solution.iterations,
            });
        }
        Ok(solution.param[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::aerodynamics::PolarTable;
    use approx::assert_relative_eq;

    fn coeffs() -> AeroCoefficients {
        AeroCoefficients::from_table(&PolarTable::flat_plate()).unwrap()
    }

    #[test]
    fn hover_trim_is_balanced() {
        let coeffs = coeffs();
        let params = PhysicalParams::qbit();
        let solver = TrimSolver::new(&coeffs, params, TrimSettings::default());

        let result = solver.solve(TrimCondition::Hover).unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.solution.theta, FRAC_PI_2);
        // Wash drag is a download: hover needs slightly more than weight.
        assert!(result.solution.total_thrust() > params.weight());
        assert!(result.solution.total_thrust() < 1.2 * params.weight());
        assert!(result.residuals.max_abs() < 1e-6);
    }

    #[test]
    fn forward_trim_residuals_vanish_through_the_airflow_model() {
        let coeffs = coeffs();
        let params = PhysicalParams::qbit();
        let solver = TrimSolver::new(&coeffs, params, TrimSettings::default());

        let result = solver
            .solve(TrimCondition::ForwardFlight { airspeed: 25.0 })
            .unwrap();

        assert!(result.converged);
        // Feeding the solution back through the airflow model leaves no
        // force or moment imbalance.
        assert!(result.residuals.horizontal_force.abs() <= 1e-6);
        assert!(result.residuals.vertical_force.abs() <= 1e-6);
        assert!(result.residuals.pitch_moment.abs() <= 1e-6);

        // Fast cruise: nose well below the hover attitude.
        assert!(result.solution.theta > 0.0);
        assert!(result.solution.theta < FRAC_PI_4);
        assert!(result.solution.thrust_top > 0.0);
        assert!(result.solution.thrust_bottom > 0.0);
    }

    #[test]
    fn trim_not_found_for_unreachable_condition() {
        let coeffs = coeffs();
        let params = PhysicalParams::qbit();
        let settings = TrimSettings {
            max_iterations: 30,
            use_newton_refinement: false,
            ..Default::default()
        };
        let solver = TrimSolver::new(&coeffs, params, settings);

        // The imbalance at this airspeed is enormous; thirty direct-search
        // iterations cannot close it.
        let result = solver.solve(TrimCondition::ForwardFlight { airspeed: 1.0e4 });
        assert!(matches!(result, Err(SimError::TrimNotFound { .. })));
    }

    #[test]
    fn terminal_alpha_carries_the_requested_lift_fraction() {
        let coeffs = coeffs();
        let params = PhysicalParams::qbit();
        let solver = TrimSolver::new(&coeffs, params, TrimSettings::default());

        let alpha = solver.solve_terminal_alpha(25.0, 1.0).unwrap();
        assert!(alpha > 0.0);

        let cl = coeffs.evaluate(rad_to_deg(alpha)).cl;
        let lift = 0.5 * params.air_density * 25.0 * 25.0 * params.wing_area() * cl;
        assert_relative_eq!(lift / params.weight(), 1.0, epsilon = 1e-6);
    }
}
