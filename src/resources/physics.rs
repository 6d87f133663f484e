use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Physical constants of the vehicle and atmosphere. Set once at
/// configuration time and never mutated during a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalParams {
    /// Vehicle mass [kg].
    pub mass: f64,
    /// Gravitational acceleration [m/s^2].
    pub gravity: f64,
    /// Moment of inertia about the pitch axis [kg m^2].
    pub inertia: f64,
    /// Wing chord [m].
    pub chord: f64,
    /// Wing span [m].
    pub span: f64,
    /// Propeller radius [m].
    pub prop_radius: f64,
    /// Distance from the pitch axis to each rotor's thrust line [m].
    pub arm_length: f64,
    /// Air density [kg/m^3].
    pub air_density: f64,
    /// Fraction of the momentum-theory slipstream speed that reaches the
    /// wing. Dimensionless, usually close to one.
    pub wash_efficiency: f64,
}

impl PhysicalParams {
    /// Parameter set of the QBiT flight-test vehicle.
    pub fn qbit() -> Self {
        Self {
            mass: 0.8652,
            gravity: 9.81,
            inertia: 0.00978,
            chord: 0.087,
            span: 1.016,
            prop_radius: 0.127,
            arm_length: 0.244,
            air_density: 1.2,
            wash_efficiency: 1.0,
        }
    }

    /// Reference wing area, chord times span.
    pub fn wing_area(&self) -> f64 {
        self.chord * self.span
    }

    /// Actuator disk area of one propeller.
    pub fn disk_area(&self) -> f64 {
        PI * self.prop_radius * self.prop_radius
    }

    /// Vehicle weight [N].
    pub fn weight(&self) -> f64 {
        self.mass * self.gravity
    }
}

impl Default for PhysicalParams {
    fn default() -> Self {
        Self::qbit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn qbit_derived_quantities() {
        let params = PhysicalParams::qbit();
        assert_relative_eq!(params.wing_area(), 0.087 * 1.016);
        assert_relative_eq!(params.disk_area(), PI * 0.127 * 0.127);
        assert_relative_eq!(params.weight(), 0.8652 * 9.81);
    }
}
