//! Physical quantities along the orbits of a run.
//!
//! A quantity is taken, in order, from the orbit table itself, from the
//! initial state of the sample's marker, or evaluated from the stored fields
//! according to the [`OrbitKind`] of the run. Every result comes back sorted
//! by marker identifier and then by time.

mod endcond;
mod physics;

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use ndarray::Array1;
use tracing::debug;

use crate::quantity::canonicalize;
use crate::run::RunData;
use crate::store::{Category, Payload, Store};
use crate::units::UnitClass;
use crate::Error;

pub use endcond::EndCondition;
pub use physics::{Evaluator, FieldLineInput, Formulas, GuidingCenterInput, ParticleInput};

/// The representation the orbit samples of a run are stored in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrbitKind {
    FieldLine,
    GuidingCenter,
    Particle,
}

impl OrbitKind {
    /// Infers the kind from the fields of an orbit table.
    pub fn classify(orbit: &Payload) -> Self {
        if orbit.contains_quantity("mu") {
            OrbitKind::GuidingCenter
        } else if orbit.contains_quantity("charge") {
            OrbitKind::Particle
        } else {
            OrbitKind::FieldLine
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrbitKind::FieldLine => "fieldline",
            OrbitKind::GuidingCenter => "guidingcenter",
            OrbitKind::Particle => "particle",
        }
    }
}

impl fmt::Display for OrbitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrbitKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fieldline" => Ok(OrbitKind::FieldLine),
            "guidingcenter" => Ok(OrbitKind::GuidingCenter),
            "particle" => Ok(OrbitKind::Particle),
            other => Err(Error::Malformed(format!("\"{}\" is not an orbit kind", other))),
        }
    }
}

/// Restricts and formats the output of [`Orbits::get`].
#[derive(Clone, Debug)]
pub struct Selection {
    /// Only samples of these markers.
    pub ids: Option<Vec<i64>>,
    /// Only samples of markers that ended with this condition.
    pub endcond: Option<String>,
    /// SI units when true, display units otherwise.
    pub si: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self { ids: None, endcond: None, si: true }
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids<I: IntoIterator<Item = i64>>(mut self, ids: I) -> Self {
        self.ids = Some(ids.into_iter().collect());
        self
    }

    pub fn endcond(mut self, name: &str) -> Self {
        self.endcond = Some(name.to_string());
        self
    }

    pub fn display_units(mut self) -> Self {
        self.si = false;
        self
    }
}

/// Permutation ordering samples by identifier and then by time.
///
/// The sort is stable, so samples with equal keys keep their stored order.
pub fn sort_order(ids: &Array1<i64>, times: &Array1<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..ids.len()).collect();
    order.sort_by(|&a, &b| match ids[a].cmp(&ids[b]) {
        Ordering::Equal => times[a].total_cmp(&times[b]),
        unequal => unequal,
    });
    order
}

fn permute<T: Clone>(values: &Array1<T>, order: &[usize]) -> Array1<T> {
    order.iter().map(|&i| values[i].clone()).collect()
}

/// Accessor for the orbit samples of one run.
pub struct Orbits {
    run: RunData,
    kind: OrbitKind,
    evaluator: Box<dyn Evaluator>,
}

impl Orbits {
    /// Reads the run matching `run_tag` from the store.
    pub fn open(store: &Store, run_tag: &str) -> Result<Self, Error> {
        let qid = store.resolve(Category::Results, run_tag)?;
        Ok(Self::from_run(store.read_run(&qid)?))
    }

    /// Wraps a run that has already been read.
    pub fn from_run(run: RunData) -> Self {
        let kind = match run.orbit_kind {
            Some(kind) => kind,
            None => {
                let kind = OrbitKind::classify(&run.orbit);
                debug!(qid = %run.meta.qid, %kind, "classified orbit data");
                kind
            }
        };
        Self { run, kind, evaluator: Box::new(Formulas) }
    }

    /// Replaces the physics used for derived quantities.
    pub fn with_evaluator(mut self, evaluator: Box<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn kind(&self) -> OrbitKind {
        self.kind
    }

    pub fn run(&self) -> &RunData {
        &self.run
    }

    /// The quantity in SI units for every sample, ordered by identifier and time.
    pub fn quantity(&self, name: &str) -> Result<Array1<f64>, Error> {
        let key = canonicalize(name)?;
        let values = self.evaluate(key)?;
        let (ids, order) = self.sample_order()?;
        if values.len() != ids.len() {
            return Err(Error::InconsistentShape {
                array_name: key.to_string(),
                input_length: values.len(),
                expected_length: ids.len(),
            });
        }
        Ok(permute(&values, &order))
    }

    /// The quantity restricted to a selection of markers.
    pub fn get(&self, name: &str, selection: &Selection) -> Result<Array1<f64>, Error> {
        let key = canonicalize(name)?;
        let values = self.quantity(key)?;
        let (ids, order) = self.sample_order()?;
        let ids = permute(&ids, &order);

        let wanted: Option<HashSet<i64>> =
            selection.ids.as_ref().map(|ids| ids.iter().copied().collect());
        let conditions = match &selection.endcond {
            Some(_) => Some(self.end_conditions()?),
            None => None,
        };
        let keep = |id: &i64| {
            let in_ids = wanted.as_ref().map_or(true, |wanted| wanted.contains(id));
            let in_endcond = match (&selection.endcond, &conditions) {
                (Some(name), Some(conditions)) => {
                    conditions.get(id).map_or(false, |ec| ec.matches(name))
                }
                _ => true,
            };
            in_ids && in_endcond
        };
        let selected: Array1<f64> = ids
            .iter()
            .zip(values.iter())
            .filter(|(id, _)| keep(*id))
            .map(|(_, &value)| value)
            .collect();

        Ok(if selection.si { selected } else { UnitClass::for_quantity(key).to_display(selected) })
    }

    /// A quantity of the initial state in SI units, ordered by identifier.
    pub fn initial(&self, name: &str) -> Result<Array1<f64>, Error> {
        let key = canonicalize(name)?;
        let inistate = &self.run.inistate;
        let (_, column) = inistate
            .find(key)
            .ok_or_else(|| Error::NotFound { what: format!("\"{}\" in the initial state", key) })?;
        let ids = id_column(inistate, "inistate")?;
        let order = sort_order(&ids, &Array1::zeros(ids.len()));
        Ok(permute(&column.to_si(key), &order))
    }

    /// End condition of every marker, keyed by identifier.
    pub fn end_conditions(&self) -> Result<HashMap<i64, EndCondition>, Error> {
        let endstate = &self.run.endstate;
        let ids = id_column(endstate, "endstate")?;
        let code = |key: &str| {
            endstate
                .find(key)
                .map(|(_, column)| column.values.to_i64())
                .ok_or_else(|| Error::NotFound { what: format!("\"{}\" in the end state", key) })
        };
        let endcond = code("endcond")?;
        let errormsg = code("errormsg")?;
        Ok(ids
            .iter()
            .zip(endcond.iter().zip(errormsg.iter()))
            .map(|(&id, (&endcond, &errormsg))| (id, EndCondition::new(endcond, errormsg)))
            .collect())
    }

    fn sample_order(&self) -> Result<(Array1<i64>, Vec<usize>), Error> {
        let ids = id_column(&self.run.orbit, "orbit")?;
        let times = match self.run.orbit.find("time") {
            Some((_, column)) => column.to_si("time"),
            None => Array1::zeros(ids.len()),
        };
        let order = sort_order(&ids, &times);
        Ok((ids, order))
    }

    /// The quantity in storage order.
    fn evaluate(&self, key: &str) -> Result<Array1<f64>, Error> {
        if let Some(values) = self.stored(key)? {
            return Ok(values);
        }
        debug!(key, kind = %self.kind, "evaluating quantity");
        match self.kind {
            OrbitKind::GuidingCenter => {
                let input = GuidingCenterInput {
                    mass: self.required("mass")?,
                    charge: self.required("charge")?,
                    r: self.required("r")?,
                    phi: self.required("phi")?,
                    z: self.required("z")?,
                    mu: self.required("mu")?,
                    vpar: self.required("vpar")?,
                    zeta: self.required("zeta")?,
                    br: self.required("br")?,
                    bphi: self.required("bphi")?,
                    bz: self.required("bz")?,
                };
                self.evaluator.guiding_center(key, &input)
            }
            OrbitKind::Particle => {
                let input = ParticleInput {
                    mass: self.required("mass")?,
                    charge: self.required("charge")?,
                    r: self.required("r")?,
                    phi: self.required("phi")?,
                    z: self.required("z")?,
                    vr: self.required("vr")?,
                    vphi: self.required("vphi")?,
                    vz: self.required("vz")?,
                    br: self.required("br")?,
                    bphi: self.required("bphi")?,
                    bz: self.required("bz")?,
                };
                self.evaluator.particle(key, &input)
            }
            OrbitKind::FieldLine => {
                let input = FieldLineInput {
                    r: self.required("r")?,
                    phi: self.required("phi")?,
                    z: self.required("z")?,
                    br: self.required("br")?,
                    bphi: self.required("bphi")?,
                    bz: self.required("bz")?,
                };
                self.evaluator.field_line(key, &input)
            }
        }
    }

    /// A stored field of the orbit table, or failing that of the marker's
    /// initial state broadcast to each of its samples.
    fn stored(&self, key: &str) -> Result<Option<Array1<f64>>, Error> {
        if let Some((_, column)) = self.run.orbit.find(key) {
            return Ok(Some(column.to_si(key)));
        }
        let inistate = &self.run.inistate;
        let column = match inistate.find(key) {
            Some((_, column)) => column,
            None => return Ok(None),
        };
        let by_id: HashMap<i64, f64> = id_column(inistate, "inistate")?
            .iter()
            .copied()
            .zip(column.to_si(key).iter().copied())
            .collect();
        id_column(&self.run.orbit, "orbit")?
            .iter()
            .map(|id| {
                by_id.get(id).copied().ok_or_else(|| Error::NotFound {
                    what: format!("marker {} in the initial state", id),
                })
            })
            .collect::<Result<Array1<f64>, Error>>()
            .map(Some)
    }

    fn required(&self, key: &str) -> Result<Array1<f64>, Error> {
        self.stored(key)?.ok_or_else(|| Error::NotFound {
            what: format!("\"{}\" in {} orbit data", key, self.kind),
        })
    }
}

fn id_column(table: &Payload, table_name: &str) -> Result<Array1<i64>, Error> {
    table
        .find("id")
        .map(|(_, column)| column.values.to_i64())
        .ok_or_else(|| Error::NotFound { what: format!("marker identifiers in {}", table_name) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn kind_is_inferred_from_fields() {
        let gc = Payload::new()
            .with_floats("mu", array![1.0], Some("eV/T"))
            .with_floats("charge", array![1.0], None);
        let prt = Payload::new().with_floats("charge", array![1.0], Some("e"));
        assert_eq!(OrbitKind::classify(&gc), OrbitKind::GuidingCenter);
        assert_eq!(OrbitKind::classify(&prt), OrbitKind::Particle);
        assert_eq!(OrbitKind::classify(&Payload::new()), OrbitKind::FieldLine);
    }

    #[test]
    fn kind_names_parse_back() {
        for kind in [OrbitKind::FieldLine, OrbitKind::GuidingCenter, OrbitKind::Particle] {
            assert_eq!(kind.as_str().parse::<OrbitKind>().unwrap(), kind);
        }
        assert!("wobble".parse::<OrbitKind>().is_err());
    }

    #[test]
    fn ties_keep_stored_order() {
        let order = sort_order(&array![2, 1, 2, 1], &array![0.0, 1.0, 0.0, 0.5]);
        assert_eq!(order, vec![3, 1, 0, 2]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn order_is_lexicographic(
            samples in prop::collection::vec((0i64..5, -1.0e3f64..1.0e3), 1..60)
        ) {
            let ids: Array1<i64> = samples.iter().map(|s| s.0).collect();
            let times: Array1<f64> = samples.iter().map(|s| s.1).collect();
            let order = sort_order(&ids, &times);
            for pair in order.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                prop_assert!(ids[a] < ids[b] || (ids[a] == ids[b] && times[a] <= times[b]));
            }
        }
    }
}
