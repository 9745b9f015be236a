//! Physical constants (CODATA 2018).
//!
//! Every conversion and formula in the crate draws from this set so that
//! stored and derived quantities stay mutually consistent.

/// Elementary charge [C] (exact).
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;
/// Speed of light in vacuum [m/s] (exact).
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
/// Atomic mass constant [kg].
pub const ATOMIC_MASS_UNIT: f64 = 1.660_539_066_60e-27;
/// Electron mass [kg].
pub const ELECTRON_MASS: f64 = 9.109_383_701_5e-31;
/// Electron mass [amu].
pub const ELECTRON_MASS_AMU: f64 = ELECTRON_MASS / ATOMIC_MASS_UNIT;
/// Degrees to radians.
pub const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;
