//! Physics regression tests: write inputs, run the engine, check the output
//! against analytical predictions.

pub mod elementary;

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::driver::{RunDriver, DUMMY_TAG};
use crate::store::{Category, Payload, Store};
use crate::Error;

/// One stage of a regression test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Init,
    Run,
    Check,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Init, Phase::Run, Phase::Check];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Init => "init",
            Phase::Run => "run",
            Phase::Check => "check",
        })
    }
}

impl FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(Phase::Init),
            "run" => Ok(Phase::Run),
            "check" => Ok(Phase::Check),
            other => Err(Error::Usage(format!(
                "unknown phase \"{}\", expected init, run or check",
                other
            ))),
        }
    }
}

/// Phases selected by the positional arguments: all of them when there are
/// none, otherwise the single one named.
pub fn phases_from_args<S: AsRef<str>>(args: &[S]) -> Result<Vec<Phase>, Error> {
    match args {
        [] => Ok(Phase::ALL.to_vec()),
        [phase] => Ok(vec![phase.as_ref().parse()?]),
        _ => Err(Error::Usage("expected at most one of init, run or check".to_string())),
    }
}

/// A test case exercising the engine.
pub trait PhysicsTest {
    /// Description tag shared by the inputs and the run of this test.
    fn name(&self) -> &str;
    fn init(&self, store: &Store) -> Result<(), Error>;
    fn run(&self, driver: &RunDriver) -> Result<(), Error>;
    /// Whether the stored run agrees with the prediction.
    fn check(&self, store: &Store) -> Result<bool, Error>;
}

/// Runs the selected phases of a test, returning the verdict if the check
/// phase was among them.
pub fn execute(
    test: &dyn PhysicsTest,
    store: &Store,
    driver: &RunDriver,
    phases: &[Phase],
    verbose: bool,
) -> Result<Option<bool>, Error> {
    let bar = if verbose {
        Some(indicatif::ProgressBar::new(phases.len() as u64))
    } else {
        None
    };

    let mut verdict = None;
    for &phase in phases {
        info!(test = test.name(), %phase, "starting phase");
        match phase {
            Phase::Init => test.init(store)?,
            Phase::Run => test.run(driver)?,
            Phase::Check => verdict = Some(test.check(store)?),
        }
        if let Some(ref bar) = bar {
            bar.inc(1);
        }
    }

    if let Some(ref bar) = bar {
        bar.finish();
    }
    Ok(verdict)
}

/// Writes `DUMMY` groups to the input categories tests usually leave empty,
/// unless they are already present.
pub fn ensure_placeholders(store: &Store) -> Result<(), Error> {
    let placeholders = [
        (Category::Neutral, "N0_1D"),
        (Category::Boozer, "Boozer"),
        (Category::Mhd, "MHD_STAT"),
        (Category::Asigma, "asigma_loc"),
    ];
    for (category, type_name) in placeholders {
        if !store.contains(category, DUMMY_TAG)? {
            let payload = Payload::new().with_int_scalar("dummy", 0, None);
            store.create_group(category, type_name, &payload, Some(DUMMY_TAG))?;
        }
    }
    Ok(())
}
