//! A versioned data store and orbit accessor for particle-orbit simulations.
//!
//! Inputs (fields, markers, options, ...) and simulation results live as
//! timestamped, uniquely identified groups inside a single HDF5 container.
//! The [`Store`] creates, lists, resolves and activates those groups, while
//! [`Orbits`] turns the raw samples of a run into sorted physical quantities.

mod run;

pub mod constants;
pub mod driver;
pub mod marker;
pub mod orbit;
pub mod prelude;
pub mod quantity;
pub mod regression;
pub mod store;
pub mod units;

pub use driver::{InputMask, RunDriver, RunDriverDescriptor};
pub use marker::MarkerPopulation;
pub use orbit::{EndCondition, Evaluator, Formulas, OrbitKind, Orbits, Selection};
pub use run::{RunData, RunOutput};
pub use store::{Category, Column, GroupData, GroupMeta, GroupSummary, Payload, Store, Values};
pub use units::UnitClass;

/// Represents an error in the data store or accessor.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No {what} found")]
    NotFound { what: String },
    #[error("Identifier {0} is already in use")]
    DuplicateIdentifier(String),
    #[error("No {category} group matches tag \"{tag}\"")]
    AmbiguousOrNotFound { category: Category, tag: String },
    #[error("Unknown quantity \"{0}\"")]
    UnknownQuantity(String),
    #[error("Quantity \"{quantity}\" cannot be derived from {kind} data")]
    Underivable { quantity: String, kind: OrbitKind },
    #[error("{array_name} array does not have expected length \
        ( {array_name} array length: {input_length}, \
        expected length: {expected_length} )")]
    InconsistentShape {
        array_name: String,
        input_length: usize,
        expected_length: usize,
    },
    #[error("Simulation engine failed (exit status: {status:?}): {message}")]
    ExternalEngineFailure { status: Option<i32>, message: String },
    #[error("Malformed container content: {0}")]
    Malformed(String),
    #[error("Usage: {0}")]
    Usage(String),
    #[error(transparent)]
    H5Error(#[from] hdf5::Error),
    #[error(transparent)]
    StringError(#[from] hdf5::types::StringError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Timestamp(#[from] chrono::ParseError),
}
