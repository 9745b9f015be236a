use std::collections::BTreeMap;

use tracing::info;

use crate::orbit::OrbitKind;
use crate::store::{
    active_qid, find_group, fresh_qid, insert_group, read_string_attr_opt, write_string_attr,
    Category, GroupMeta, Payload, Store,
};
use crate::Error;

const INISTATE: &str = "inistate";
const ENDSTATE: &str = "endstate";
const ORBIT: &str = "orbit";
const DISTRIBUTION: &str = "distribution";
const ORBIT_KIND_ATTR: &str = "orbit_kind";
const RUN_TYPE: &str = "run";

/// Describes the output of a simulation run to be written to the store.
#[derive(Clone, Debug, Default)]
pub struct RunOutput {
    /// Per-marker state at the start of the simulation.
    pub inistate: Payload,
    /// Per-marker state at the end, including `endcond` and `errormsg`.
    pub endstate: Payload,
    /// Per-sample trajectory table (`id`, `time` and mode-dependent fields).
    pub orbit: Payload,
    /// Binned phase-space histograms.
    pub distribution: Payload,
    /// Stored alongside the orbit table; inferred from its fields when `None`.
    pub orbit_kind: Option<OrbitKind>,
}

/// A run read back from the store.
#[derive(Clone, Debug)]
pub struct RunData {
    pub meta: GroupMeta,
    /// Identifiers of the inputs that were active when the run was written.
    pub parents: BTreeMap<Category, String>,
    pub inistate: Payload,
    pub endstate: Payload,
    pub orbit: Payload,
    pub distribution: Payload,
    /// The orbit kind recorded with the run, if any.
    pub orbit_kind: Option<OrbitKind>,
}

fn parent_attr(category: Category) -> String {
    format!("qid_{}", category.section())
}

fn read_table(run: &hdf5::Group, name: &str) -> Result<Payload, Error> {
    if run.link_exists(name) {
        Payload::read(&run.group(name)?)
    } else {
        Ok(Payload::new())
    }
}

impl Store {
    /// Appends a run to the results section, recording the currently active
    /// inputs as its parents.
    pub fn write_run(
        &self,
        output: &RunOutput,
        description: Option<&str>,
    ) -> Result<String, Error> {
        let markers = output.inistate.row_count(INISTATE)?;
        let ended = output.endstate.row_count(ENDSTATE)?;
        if !output.endstate.is_empty() && ended != markers {
            return Err(Error::InconsistentShape {
                array_name: ENDSTATE.to_string(),
                input_length: ended,
                expected_length: markers,
            });
        }
        output.orbit.row_count(ORBIT)?;

        let orbit_kind = output.orbit_kind.unwrap_or_else(|| OrbitKind::classify(&output.orbit));

        let file = self.write_file()?;
        let mut parents = Vec::new();
        for category in Category::INPUTS {
            if let Some(qid) = active_qid(&file, category)? {
                parents.push((category, qid));
            }
        }
        let qid = fresh_qid(&file)?;
        let qid = insert_group(&file, Category::Results, RUN_TYPE, &qid, description, |run| {
            for (category, parent) in &parents {
                write_string_attr(run, &parent_attr(*category), parent)?;
            }
            for (name, table) in [
                (INISTATE, &output.inistate),
                (ENDSTATE, &output.endstate),
                (ORBIT, &output.orbit),
                (DISTRIBUTION, &output.distribution),
            ] {
                table.write(&run.create_group(name)?)?;
            }
            write_string_attr(&run.group(ORBIT)?, ORBIT_KIND_ATTR, orbit_kind.as_str())
        })?;
        info!(qid = %qid, markers, %orbit_kind, "wrote run");
        Ok(qid)
    }

    /// Reads every table of a run.
    pub fn read_run(&self, qid: &str) -> Result<RunData, Error> {
        let file = self.read_file()?;
        let (meta, run) = find_group(&file, Category::Results, qid)?;
        let orbit_kind = if run.link_exists(ORBIT) {
            read_string_attr_opt(&run.group(ORBIT)?, ORBIT_KIND_ATTR)?
                .map(|kind| kind.parse())
                .transpose()?
        } else {
            None
        };
        Ok(RunData {
            parents: read_parents(&run)?,
            inistate: read_table(&run, INISTATE)?,
            endstate: read_table(&run, ENDSTATE)?,
            orbit: read_table(&run, ORBIT)?,
            distribution: read_table(&run, DISTRIBUTION)?,
            orbit_kind,
            meta,
        })
    }

    /// The inputs a run was produced from.
    pub fn parents(&self, qid: &str) -> Result<BTreeMap<Category, String>, Error> {
        let file = self.read_file()?;
        let (_, run) = find_group(&file, Category::Results, qid)?;
        read_parents(&run)
    }

    /// Records the orbit kind of a run that was written without one.
    pub fn set_orbit_kind(&self, qid: &str, kind: OrbitKind) -> Result<(), Error> {
        let file = self.write_file()?;
        let (_, run) = find_group(&file, Category::Results, qid)?;
        let orbit = if run.link_exists(ORBIT) {
            run.group(ORBIT)?
        } else {
            run.create_group(ORBIT)?
        };
        write_string_attr(&orbit, ORBIT_KIND_ATTR, kind.as_str())
    }
}

fn read_parents(run: &hdf5::Group) -> Result<BTreeMap<Category, String>, Error> {
    let mut parents = BTreeMap::new();
    for category in Category::INPUTS {
        if let Some(qid) = read_string_attr_opt(run, &parent_attr(category))? {
            parents.insert(category, qid);
        }
    }
    Ok(parents)
}
