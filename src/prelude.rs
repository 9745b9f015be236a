//! Includes commonly used library components.

pub use crate::{
    Category,
    Error,
    GroupMeta,
    InputMask,
    MarkerPopulation,
    Orbits,
    OrbitKind,
    Payload,
    RunDriver,
    RunDriverDescriptor,
    RunOutput,
    Selection,
    Store,
};
pub use crate::orbit::Evaluator;
pub use crate::regression::{Phase, PhysicsTest};
