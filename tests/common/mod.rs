#![allow(dead_code)]

use ndarray::{array, Array1};
use orbit_store::{Payload, RunOutput, Store};
use tempfile::TempDir;

/// A store in a temporary directory that lives as long as the value.
pub struct TempStore {
    _dir: TempDir,
    pub store: Store,
}

impl std::ops::Deref for TempStore {
    type Target = Store;

    fn deref(&self) -> &Store {
        &self.store
    }
}

pub fn temp_store() -> TempStore {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::create(dir.path().join("test.h5")).unwrap();
    TempStore { _dir: dir, store }
}

pub fn uniform_field() -> Payload {
    Payload::new().with_floats("bxyz", array![5.0, 0.0, 0.0], Some("T"))
}

/// Per-marker initial state with masses in amu and charges in e.
pub fn inistate(ids: &[i64], mass: f64, charge: i64) -> Payload {
    let n = ids.len();
    Payload::new()
        .with_ints("id", Array1::from(ids.to_vec()), None)
        .with_floats("mass", Array1::from_elem(n, mass), Some("amu"))
        .with_ints("charge", Array1::from_elem(n, charge), Some("e"))
}

pub fn endstate(ids: &[i64], endcond: &[i64], errormsg: &[i64]) -> Payload {
    Payload::new()
        .with_ints("id", Array1::from(ids.to_vec()), None)
        .with_ints("endcond", Array1::from(endcond.to_vec()), None)
        .with_ints("errormsg", Array1::from(errormsg.to_vec()), None)
}

/// Field-line samples stored out of order; `r` encodes the sort position as
/// `10 * id + time`.
pub fn field_line_orbit(ids: &[i64], times: &[f64]) -> Payload {
    let n = ids.len();
    let r: Array1<f64> = ids.iter().zip(times).map(|(&id, &t)| 10.0 * id as f64 + t).collect();
    Payload::new()
        .with_ints("id", Array1::from(ids.to_vec()), None)
        .with_floats("time", Array1::from(times.to_vec()), Some("s"))
        .with_floats("r", r, Some("m"))
        .with_floats("phi", Array1::from_elem(n, 90.0), Some("deg"))
        .with_floats("z", Array1::zeros(n), Some("m"))
        .with_floats("br", Array1::zeros(n), Some("T"))
        .with_floats("bphi", Array1::from_elem(n, 5.0), Some("T"))
        .with_floats("bz", Array1::zeros(n), Some("T"))
}

/// Adds the guiding-center fields to an orbit table.
pub fn with_guiding_center(orbit: Payload, mu_ev_per_t: f64, vpar: f64) -> Payload {
    let n = orbit.row_count("orbit").unwrap();
    orbit
        .with_ints("charge", Array1::from_elem(n, 1), Some("e"))
        .with_floats("mu", Array1::from_elem(n, mu_ev_per_t), Some("eV/T"))
        .with_floats("vpar", Array1::from_elem(n, vpar), Some("m/s"))
        .with_floats("zeta", Array1::zeros(n), Some("rad"))
}

pub fn write_run(store: &Store, output: &RunOutput, description: &str) -> String {
    store.write_run(output, Some(description)).unwrap()
}
