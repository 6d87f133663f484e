use nalgebra::Vector2;

use crate::components::trim::TrimSolver;
use crate::components::{
    AeroForces, AirflowData, ReferenceSample, SimState, ThrustCommand, TrimResult,
};
use crate::resources::SimConfig;
use crate::systems::aerodynamics::{compute_airflow, AeroCoefficients, PolarTable};
use crate::systems::control::control;
use crate::systems::physics::advance;
use crate::systems::trajectory::{plan_maneuver, ManeuverPlan};
use crate::utils::SimError;

/// Everything known about one sample of the run: the state, the reference
/// it was tracking, the thrust applied from this sample onward, and the
/// derived airflow/load/controller quantities.
#[derive(Debug, Clone, Copy)]
pub struct StepRecord {
    pub time: f64,
    pub state: SimState,
    pub reference: ReferenceSample,
    pub thrust: ThrustCommand,
    pub airflow: AirflowData,
    pub forces: AeroForces,
    /// Net force the controller asked the thrust vector to produce.
    pub desired_force: Vector2<f64>,
    /// Commanded translational acceleration before force inversion.
    pub desired_accel: Vector2<f64>,
}

/// Complete time history of one run: one immutable record per grid sample,
/// owned by the orchestrator. Boundary samples of the derived fields are
/// neighbor-copies (see [`pad_boundary_samples`]), not loop results.
#[derive(Debug, Clone)]
pub struct SimOutput {
    pub steps: Vec<StepRecord>,
    pub trim: TrimResult,
}

impl SimOutput {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn final_state(&self) -> &SimState {
        &self.steps.last().expect("output grid is non-empty").state
    }
}

/// Closed-loop simulation of one configured maneuver.
///
/// Construction does all the fallible work: config validation, building
/// the polar interpolants, trim solving and trajectory planning. Once a
/// `Simulation` exists, `run` always completes the full time grid.
pub struct Simulation {
    config: SimConfig,
    coeffs: AeroCoefficients,
    plan: ManeuverPlan,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;

        let table = match &config.polar {
            Some(samples) => PolarTable::new(samples.clone()),
            None => PolarTable::flat_plate(),
        };
        let coeffs = AeroCoefficients::from_table(&table)?;

        let solver = TrimSolver::new(&coeffs, config.params, config.trim);
        let plan = plan_maneuver(
            &config.maneuver,
            config.samples(),
            config.dt,
            config.cruise_speed,
            &config.params,
            &coeffs,
            &solver,
        )?;

        Ok(Self {
            config,
            coeffs,
            plan,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Trim solution the maneuver is seeded from.
    pub fn trim(&self) -> &TrimResult {
        &self.plan.trim
    }

    /// Run the closed loop over the whole grid.
    ///
    /// Per step `i`: airflow and wing loads from the state and thrust at
    /// `i - 1` (completing record `i - 1`), the controller's new thrust
    /// at `i`, then the integrator's state at `i` using the new thrust
    /// with the one-step-old aero loads.
    pub fn run(&self) -> SimOutput {
        let n = self.config.samples();
        let dt = self.config.dt;
        let params = &self.config.params;

        let mut steps = Vec::with_capacity(n);
        steps.push(StepRecord {
            time: 0.0,
            state: self.plan.initial_state,
            reference: self.plan.reference[0],
            thrust: self.plan.initial_thrust,
            airflow: AirflowData::default(),
            forces: AeroForces::zero(),
            desired_force: Vector2::zeros(),
            desired_accel: Vector2::zeros(),
        });

        for i in 1..n {
            let prev = steps[i - 1];
            let (air, load) = compute_airflow(
                &prev.state,
                &prev.thrust,
                params,
                &self.coeffs,
                self.config.aero_enabled,
            );
            steps[i - 1].airflow = air;
            steps[i - 1].forces = load;

            let out = control(
                &prev.state,
                &prev.reference,
                &air,
                &load,
                params,
                &self.config.gains,
            );
            let state = advance(
                self.config.scheme,
                &prev.state,
                &out.thrust,
                &load,
                air.effective_alpha,
                params,
                dt,
            );

            steps.push(StepRecord {
                time: i as f64 * dt,
                state,
                reference: self.plan.reference[i],
                thrust: out.thrust,
                airflow: AirflowData::default(),
                forces: AeroForces::zero(),
                desired_force: out.force_des,
                desired_accel: out.accel_des,
            });
        }

        pad_boundary_samples(&mut steps);

        SimOutput {
            steps,
            trim: self.plan.trim.clone(),
        }
    }
}

/// Neighbor-copy the boundary samples the loop never computes: the last
/// record's airflow/loads (there is no step after the final state) and the
/// first record's controller outputs (the initial thrust is a boundary
/// condition, not a controller result). A presentation convention for
/// downstream consumers, not a numerical result.
fn pad_boundary_samples(steps: &mut [StepRecord]) {
    let n = steps.len();
    if n < 2 {
        return;
    }
    steps[n - 1].airflow = steps[n - 2].airflow;
    steps[n - 1].forces = steps[n - 2].forces;
    steps[0].desired_force = steps[1].desired_force;
    steps[0].desired_accel = steps[1].desired_accel;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::physics::IntegrationScheme;
    use crate::systems::trajectory::Maneuver;
    use approx::assert_relative_eq;

    #[test]
    fn boundary_samples_are_neighbor_copies() {
        let config = SimConfig {
            duration: 1.0,
            ..Default::default()
        };
        let sim = Simulation::new(config).unwrap();
        let output = sim.run();
        let n = output.len();

        assert_eq!(output.steps[n - 1].airflow, output.steps[n - 2].airflow);
        assert_eq!(output.steps[n - 1].forces, output.steps[n - 2].forces);
        assert_eq!(
            output.steps[0].desired_force,
            output.steps[1].desired_force
        );
        assert_eq!(
            output.steps[0].desired_accel,
            output.steps[1].desired_accel
        );
    }

    #[test]
    fn trim_cruise_holds_speed_and_altitude() {
        let config = SimConfig {
            duration: 2.0,
            cruise_speed: 25.0,
            ..Default::default()
        };
        let sim = Simulation::new(config).unwrap();
        assert!(sim.trim().converged);
        let output = sim.run();

        let final_state = output.final_state();
        assert_relative_eq!(final_state.y_dot, 25.0, epsilon = 0.5);
        assert_relative_eq!(final_state.z, 0.0, epsilon = 0.5);
        assert!(output.steps.iter().all(|s| s.state.is_finite()));
    }

    #[test]
    fn grid_length_matches_the_config() {
        let config = SimConfig {
            dt: 0.02,
            duration: 1.0,
            ..Default::default()
        };
        let sim = Simulation::new(config).unwrap();
        let output = sim.run();

        assert_eq!(output.len(), 51);
        assert_eq!(output.len(), sim.config().samples());
        assert_relative_eq!(output.steps[50].time, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn euler_scheme_runs_the_same_grid() {
        let config = SimConfig {
            duration: 1.0,
            scheme: IntegrationScheme::Euler,
            maneuver: Maneuver::StepPosition { magnitude: 0.1 },
            ..Default::default()
        };
        let sim = Simulation::new(config).unwrap();
        let output = sim.run();
        assert_eq!(output.len(), 101);
        assert!(output.steps.iter().all(|s| s.state.is_finite()));
    }

    #[test]
    fn invalid_config_fails_before_any_work() {
        let config = SimConfig {
            dt: -0.01,
            ..Default::default()
        };
        assert!(matches!(
            Simulation::new(config),
            Err(SimError::InvalidConfig(_))
        ));
    }
}
