use std::collections::HashSet;
use std::ops::BitOr;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{info, warn};

use crate::orbit::OrbitKind;
use crate::store::{Category, Store};
use crate::Error;

/// Tag of the placeholder inputs used when a category has nothing matching
/// the requested tag.
pub const DUMMY_TAG: &str = "DUMMY";

/// Set of input categories to activate before a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputMask(u32);

impl InputMask {
    pub const NONE: Self = Self(0);
    pub const OPTIONS: Self = Self(1 << 0);
    pub const BFIELD: Self = Self(1 << 1);
    pub const EFIELD: Self = Self(1 << 2);
    pub const PLASMA: Self = Self(1 << 3);
    pub const NEUTRAL: Self = Self(1 << 4);
    pub const WALL: Self = Self(1 << 5);
    pub const MARKER: Self = Self(1 << 6);
    pub const BOOZER: Self = Self(1 << 7);
    pub const MHD: Self = Self(1 << 8);
    pub const ASIGMA: Self = Self(1 << 9);
    pub const ALL: Self = Self((1 << 10) - 1);

    /// The mask selecting a single input category.
    pub fn of(category: Category) -> Self {
        match category {
            Category::Options => Self::OPTIONS,
            Category::BField => Self::BFIELD,
            Category::EField => Self::EFIELD,
            Category::Plasma => Self::PLASMA,
            Category::Neutral => Self::NEUTRAL,
            Category::Wall => Self::WALL,
            Category::Marker => Self::MARKER,
            Category::Boozer => Self::BOOZER,
            Category::Mhd => Self::MHD,
            Category::Asigma => Self::ASIGMA,
            Category::Results => Self::NONE,
        }
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Selected categories in section order.
    pub fn categories(self) -> Vec<Category> {
        Category::INPUTS
            .iter()
            .copied()
            .filter(|&category| self.contains(Self::of(category)))
            .collect()
    }
}

impl BitOr for InputMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Describes how to invoke the simulation engine.
#[derive(Clone, Debug)]
pub struct RunDriverDescriptor {
    /// Path of the engine executable.
    pub engine: PathBuf,
    /// Directory the engine is started from; the current one if `None`.
    pub working_dir: Option<PathBuf>,
    /// Whether to show a spinner while the engine runs.
    pub verbose: bool,
}

/// Activates inputs and runs the external engine against a store.
pub struct RunDriver<'a> {
    store: &'a Store,
    engine: PathBuf,
    working_dir: Option<PathBuf>,
    verbose: bool,
}

impl<'a> RunDriver<'a> {
    pub fn new(store: &'a Store, desc: RunDriverDescriptor) -> Self {
        Self {
            store,
            engine: desc.engine,
            working_dir: desc.working_dir,
            verbose: desc.verbose,
        }
    }

    /// Activates, in every selected category, the group matching `tag`, or
    /// the `DUMMY` placeholder when nothing matches.
    pub fn activate_inputs(&self, tag: &str, mask: InputMask) -> Result<(), Error> {
        for category in mask.categories() {
            let qid = if self.store.contains(category, tag)? {
                self.store.resolve(category, tag)?
            } else if self.store.contains(category, DUMMY_TAG)? {
                warn!(%category, tag, "no matching input, using {} placeholder", DUMMY_TAG);
                self.store.resolve(category, DUMMY_TAG)?
            } else {
                return Err(Error::NotFound {
                    what: format!("{} group tagged {} or {}", category, tag, DUMMY_TAG),
                });
            };
            self.store.activate(category, &qid)?;
        }
        Ok(())
    }

    /// Activates the inputs for `tag` and runs the engine, returning the
    /// identifier of the run it appended.
    pub fn run(&self, tag: &str, mask: InputMask) -> Result<String, Error> {
        self.activate_inputs(tag, mask)?;
        self.launch(tag)
    }

    /// Runs the engine on the currently active inputs.
    pub fn launch(&self, tag: &str) -> Result<String, Error> {
        let before = self
            .store
            .list_groups(Category::Results)?
            .into_iter()
            .map(|summary| summary.meta.qid)
            .collect::<HashSet<_>>();

        let mut command = Command::new(&self.engine);
        command
            .arg(format!("--in={}", self.store.path().display()))
            .arg(format!("--d={}", tag))
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let spinner = if self.verbose {
            let spinner = indicatif::ProgressBar::new_spinner();
            spinner.set_message(format!("running {}", tag));
            spinner.enable_steady_tick(100);
            Some(spinner)
        } else {
            None
        };

        info!(engine = %self.engine.display(), tag, "launching engine");
        let output = command.spawn()?.wait_with_output()?;

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        if !output.status.success() {
            return Err(Error::ExternalEngineFailure {
                status: output.status.code(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let qid = self
            .store
            .list_groups(Category::Results)?
            .into_iter()
            .rev()
            .map(|summary| summary.meta.qid)
            .find(|qid| !before.contains(qid))
            .ok_or_else(|| Error::ExternalEngineFailure {
                status: output.status.code(),
                message: "engine exited without appending a run".to_string(),
            })?;

        let run = self.store.read_run(&qid)?;
        if run.orbit_kind.is_none() {
            self.store.set_orbit_kind(&qid, OrbitKind::classify(&run.orbit))?;
        }
        info!(qid = %qid, tag, "run finished");
        Ok(qid)
    }
}
