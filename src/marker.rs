//! Marker populations: the test particles or field-line tracers a
//! simulation starts from.

use ndarray::Array1;

use crate::store::{Category, Payload, Store};
use crate::Error;

/// Full-orbit markers.
#[derive(Clone, Debug)]
pub struct ParticleMarkers {
    pub ids: Array1<i64>,
    /// [amu]
    pub mass: Array1<f64>,
    /// [e]
    pub charge: Array1<i64>,
    pub r: Array1<f64>,
    /// [deg]
    pub phi: Array1<f64>,
    pub z: Array1<f64>,
    pub vr: Array1<f64>,
    pub vphi: Array1<f64>,
    pub vz: Array1<f64>,
    pub anum: Array1<i64>,
    pub znum: Array1<i64>,
    pub weight: Array1<f64>,
    pub time: Array1<f64>,
}

/// Guiding-center markers.
#[derive(Clone, Debug)]
pub struct GuidingCenterMarkers {
    pub ids: Array1<i64>,
    /// [amu]
    pub mass: Array1<f64>,
    /// [e]
    pub charge: Array1<i64>,
    pub r: Array1<f64>,
    /// [deg]
    pub phi: Array1<f64>,
    pub z: Array1<f64>,
    /// Kinetic energy [eV].
    pub energy: Array1<f64>,
    pub pitch: Array1<f64>,
    /// Gyro-angle [rad].
    pub zeta: Array1<f64>,
    pub anum: Array1<i64>,
    pub znum: Array1<i64>,
    pub weight: Array1<f64>,
    pub time: Array1<f64>,
}

/// Field-line tracers.
#[derive(Clone, Debug)]
pub struct FieldLineMarkers {
    pub ids: Array1<i64>,
    pub r: Array1<f64>,
    /// [deg]
    pub phi: Array1<f64>,
    pub z: Array1<f64>,
    pub pitch: Array1<f64>,
    pub weight: Array1<f64>,
    pub time: Array1<f64>,
}

/// State of a single guiding-center marker, in the units of [`GuidingCenterMarkers`].
#[derive(Clone, Copy, Debug)]
pub struct GuidingCenter {
    pub id: i64,
    pub mass: f64,
    pub charge: i64,
    pub r: f64,
    pub phi: f64,
    pub z: f64,
    pub energy: f64,
    pub pitch: f64,
    pub zeta: f64,
    pub anum: i64,
    pub znum: i64,
    pub weight: f64,
    pub time: f64,
}

impl GuidingCenterMarkers {
    /// Builds `n` markers, the `i`th given by `marker_fn(i)`.
    pub fn from_fn<F: Fn(usize) -> GuidingCenter>(n: usize, marker_fn: F) -> Self {
        let markers = (0..n).map(marker_fn).collect::<Vec<_>>();
        Self {
            ids: markers.iter().map(|m| m.id).collect(),
            mass: markers.iter().map(|m| m.mass).collect(),
            charge: markers.iter().map(|m| m.charge).collect(),
            r: markers.iter().map(|m| m.r).collect(),
            phi: markers.iter().map(|m| m.phi).collect(),
            z: markers.iter().map(|m| m.z).collect(),
            energy: markers.iter().map(|m| m.energy).collect(),
            pitch: markers.iter().map(|m| m.pitch).collect(),
            zeta: markers.iter().map(|m| m.zeta).collect(),
            anum: markers.iter().map(|m| m.anum).collect(),
            znum: markers.iter().map(|m| m.znum).collect(),
            weight: markers.iter().map(|m| m.weight).collect(),
            time: markers.iter().map(|m| m.time).collect(),
        }
    }
}

/// A marker input of one of the three supported representations.
#[derive(Clone, Debug)]
pub enum MarkerPopulation {
    Particle(ParticleMarkers),
    GuidingCenter(GuidingCenterMarkers),
    FieldLine(FieldLineMarkers),
}

struct Table {
    payload: Payload,
    expected: usize,
}

impl Table {
    fn new(expected: usize) -> Self {
        Self { payload: Payload::new().with_int_scalar("n", expected as i64, None), expected }
    }

    fn check(&self, name: &str, len: usize) -> Result<(), Error> {
        if len != self.expected {
            return Err(Error::InconsistentShape {
                array_name: name.to_string(),
                input_length: len,
                expected_length: self.expected,
            });
        }
        Ok(())
    }

    fn floats(mut self, name: &str, values: &Array1<f64>, unit: &str) -> Result<Self, Error> {
        self.check(name, values.len())?;
        self.payload = self.payload.with_floats(name, values.clone(), Some(unit));
        Ok(self)
    }

    fn ints(mut self, name: &str, values: &Array1<i64>, unit: &str) -> Result<Self, Error> {
        self.check(name, values.len())?;
        self.payload = self.payload.with_ints(name, values.clone(), Some(unit));
        Ok(self)
    }
}

impl MarkerPopulation {
    /// Group type written to the marker section.
    pub fn type_name(&self) -> &'static str {
        match self {
            MarkerPopulation::Particle(_) => "prt",
            MarkerPopulation::GuidingCenter(_) => "gc",
            MarkerPopulation::FieldLine(_) => "fl",
        }
    }

    pub fn count(&self) -> usize {
        match self {
            MarkerPopulation::Particle(m) => m.ids.len(),
            MarkerPopulation::GuidingCenter(m) => m.ids.len(),
            MarkerPopulation::FieldLine(m) => m.ids.len(),
        }
    }

    /// Checks every per-marker array against the marker count and lays the
    /// population out as stored datasets.
    pub fn to_payload(&self) -> Result<Payload, Error> {
        let table = Table::new(self.count());
        let table = match self {
            MarkerPopulation::Particle(m) => table
                .ints("id", &m.ids, "1")?
                .floats("mass", &m.mass, "amu")?
                .ints("charge", &m.charge, "e")?
                .floats("r", &m.r, "m")?
                .floats("phi", &m.phi, "deg")?
                .floats("z", &m.z, "m")?
                .floats("vr", &m.vr, "m/s")?
                .floats("vphi", &m.vphi, "m/s")?
                .floats("vz", &m.vz, "m/s")?
                .ints("anum", &m.anum, "1")?
                .ints("znum", &m.znum, "1")?
                .floats("weight", &m.weight, "markers/s")?
                .floats("time", &m.time, "s")?,
            MarkerPopulation::GuidingCenter(m) => table
                .ints("id", &m.ids, "1")?
                .floats("mass", &m.mass, "amu")?
                .ints("charge", &m.charge, "e")?
                .floats("r", &m.r, "m")?
                .floats("phi", &m.phi, "deg")?
                .floats("z", &m.z, "m")?
                .floats("energy", &m.energy, "eV")?
                .floats("pitch", &m.pitch, "1")?
                .floats("zeta", &m.zeta, "rad")?
                .ints("anum", &m.anum, "1")?
                .ints("znum", &m.znum, "1")?
                .floats("weight", &m.weight, "markers/s")?
                .floats("time", &m.time, "s")?,
            MarkerPopulation::FieldLine(m) => table
                .ints("id", &m.ids, "1")?
                .floats("r", &m.r, "m")?
                .floats("phi", &m.phi, "deg")?
                .floats("z", &m.z, "m")?
                .floats("pitch", &m.pitch, "1")?
                .floats("weight", &m.weight, "markers/s")?
                .floats("time", &m.time, "s")?,
        };
        Ok(table.payload)
    }
}

impl Store {
    /// Stores a marker population as the new active marker input.
    pub fn create_markers(
        &self,
        markers: &MarkerPopulation,
        description: Option<&str>,
    ) -> Result<String, Error> {
        let payload = markers.to_payload()?;
        self.create_group(Category::Marker, markers.type_name(), &payload, description)
    }
}
