mod controller;

pub use controller::{control, ControlOutput, ControllerGains};
