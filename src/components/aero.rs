use serde::{Deserialize, Serialize};

/// Airflow quantities derived from the vehicle state and thrust history.
///
/// All angles are in radians. Recomputed every step from the previous
/// step's state and thrust; never carried forward as an input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AirflowData {
    /// Inertial airspeed magnitude `V_i`.
    pub airspeed: f64,
    /// Flight path angle `gamma`; zero when the vehicle is at rest.
    pub flight_path_angle: f64,
    /// Geometric angle of attack `alpha = theta - gamma`.
    pub alpha: f64,
    /// Momentum-theory wash speed from the mean rotor thrust.
    pub wash_speed: f64,
    /// Per-rotor wash speeds, kept for bookkeeping.
    pub wash_speed_top: f64,
    pub wash_speed_bottom: f64,
    /// Airspeed seen by the wing after combining the free stream with the
    /// prop wash, `V_a`.
    pub effective_airspeed: f64,
    /// Angle of attack of the combined flow, `alpha_e`.
    pub effective_alpha: f64,
}

/// Aerodynamic loads on the wing, in Newtons and Newton-metres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AeroForces {
    pub lift: f64,
    pub drag: f64,
    pub pitch_moment: f64,
}

impl AeroForces {
    pub fn zero() -> Self {
        Self::default()
    }
}
