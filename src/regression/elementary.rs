//! Gyro-motion of an energetic electron and positron in a uniform magnetic
//! field. The orbit should be a circle with the relativistic Larmor radius.

use ndarray::{array, Array1, Array2};
use tracing::info;

use crate::constants::{ELECTRON_MASS_AMU, ELEMENTARY_CHARGE, SPEED_OF_LIGHT};
use crate::driver::{InputMask, RunDriver};
use crate::marker::{GuidingCenter, GuidingCenterMarkers, MarkerPopulation};
use crate::orbit::{Orbits, Selection};
use crate::regression::{ensure_placeholders, PhysicsTest};
use crate::store::{Category, Payload, Store};
use crate::Error;

const FIELD_STRENGTH: f64 = 5.0;
const MARKER_ENERGY: f64 = 100.0e6;
const MARKER_PITCH: f64 = 0.5;
const TOLERANCE: f64 = 0.01;

pub struct GyroMotion;

impl GyroMotion {
    pub const TAG: &'static str = "TESTELEMENTARYGYRO";

    fn options() -> Payload {
        [
            ("SIM_MODE", 1.0),
            ("FIXEDSTEP_USE_USERDEFINED", 1.0),
            ("FIXEDSTEP_USERDEFINED", 1.0e-11),
            ("ENDCOND_SIMTIMELIM", 1.0),
            ("ENDCOND_LIM_SIMTIME", 2.0e-9),
            ("ENABLE_ORBIT_FOLLOWING", 1.0),
            ("ENABLE_ORBITWRITE", 1.0),
            ("ORBITWRITE_MODE", 1.0),
            ("ORBITWRITE_INTERVAL", 1.0e-11),
            ("ORBITWRITE_NPOINT", 202.0),
        ]
        .iter()
        .fold(Payload::new(), |payload, &(name, value)| payload.with_scalar(name, value, None))
    }

    fn markers() -> MarkerPopulation {
        MarkerPopulation::GuidingCenter(GuidingCenterMarkers::from_fn(2, |i| GuidingCenter {
            id: i as i64 + 1,
            mass: ELECTRON_MASS_AMU,
            charge: if i == 0 { 1 } else { -1 },
            r: 5.0,
            phi: 90.0,
            z: 0.0,
            energy: MARKER_ENERGY,
            pitch: MARKER_PITCH,
            zeta: 0.0,
            anum: if i == 0 { 1 } else { 0 },
            znum: if i == 0 { 1 } else { 0 },
            weight: 1.0,
            time: 0.0,
        }))
    }
}

impl PhysicsTest for GyroMotion {
    fn name(&self) -> &str {
        Self::TAG
    }

    fn init(&self, store: &Store) -> Result<(), Error> {
        let tag = Some(Self::TAG);
        store.create_group(Category::Options, "opt", &Self::options(), tag)?;
        let bfield = Payload::new()
            .with_floats("bxyz", array![FIELD_STRENGTH, 0.0, 0.0], Some("T"))
            .with_floats("jacobian", Array2::<f64>::zeros((3, 3)), Some("T/m"))
            .with_scalar("rhoval", 1.5, None);
        store.create_group(Category::BField, "B_TC", &bfield, tag)?;
        let efield = Payload::new().with_floats("exyz", Array1::<f64>::zeros(3), Some("V/m"));
        store.create_group(Category::EField, "E_TC", &efield, tag)?;
        store.create_markers(&Self::markers(), tag)?;
        let wall = Payload::new()
            .with_int_scalar("nelements", 4, None)
            .with_floats("r", array![0.1, 100.0, 100.0, 0.1], Some("m"))
            .with_floats("z", array![-100.0, -100.0, 100.0, 100.0], Some("m"));
        store.create_group(Category::Wall, "wall_2D", &wall, tag)?;
        let rho = array![0.0, 0.5, 100.0];
        let plasma = Payload::new()
            .with_int_scalar("nrho", 3, None)
            .with_int_scalar("nion", 1, None)
            .with_ints("anum", array![1], None)
            .with_ints("znum", array![1], None)
            .with_floats("mass", array![1.0], Some("amu"))
            .with_ints("charge", array![1], Some("e"))
            .with_floats("edensity", Array1::from_elem(rho.len(), 1.0e20), Some("m^-3"))
            .with_floats("etemperature", Array1::from_elem(rho.len(), 1.0e3), Some("eV"))
            .with_floats("idensity", Array2::from_elem((rho.len(), 1), 1.0e20), Some("m^-3"))
            .with_floats("itemperature", Array1::from_elem(rho.len(), 1.0e3), Some("eV"))
            .with_floats("rho", rho, None);
        store.create_group(Category::Plasma, "plasma_1D", &plasma, tag)?;
        ensure_placeholders(store)
    }

    fn run(&self, driver: &RunDriver) -> Result<(), Error> {
        driver.run(Self::TAG, InputMask::ALL)?;
        Ok(())
    }

    fn check(&self, store: &Store) -> Result<bool, Error> {
        let orbits = Orbits::open(store, Self::TAG)?;
        let first = Selection::new().ids([1]);
        let y = orbits.get("y", &first)?;
        let z = orbits.get("z", &first)?;
        let (_, _, observed) = fit_circle(&y, &z)?;

        let mass = first_marker(orbits.initial("mass")?, "mass")?;
        let charge = first_marker(orbits.initial("charge")?, "charge")?;
        let mu = match orbits.initial("mu") {
            Ok(mu) => first_marker(mu, "mu")?,
            Err(Error::NotFound { .. }) => {
                magnetic_moment(mass, MARKER_ENERGY * ELEMENTARY_CHARGE, MARKER_PITCH)
            }
            Err(err) => return Err(err),
        };
        let predicted = larmor_radius(mass, charge, mu);
        let error = (observed - predicted).abs() / predicted;
        info!(observed, predicted, error, "gyro radius");
        Ok(error < TOLERANCE)
    }
}

fn first_marker(values: Array1<f64>, name: &str) -> Result<f64, Error> {
    values.first().copied().ok_or_else(|| Error::NotFound {
        what: format!("initial {} of the first marker", name),
    })
}

/// Magnetic moment [J/T] of a marker with kinetic energy `ekin` [J] and pitch
/// `pitch` in the test field.
pub fn magnetic_moment(mass: f64, ekin: f64, pitch: f64) -> f64 {
    let rest_energy = mass * SPEED_OF_LIGHT * SPEED_OF_LIGHT;
    let gamma = 1.0 + ekin / rest_energy;
    let p2 = mass * mass * SPEED_OF_LIGHT * SPEED_OF_LIGHT * (gamma * gamma - 1.0);
    p2 * (1.0 - pitch * pitch) / (2.0 * mass * FIELD_STRENGTH)
}

/// Relativistic Larmor radius in the test field.
pub fn larmor_radius(mass: f64, charge: f64, mu: f64) -> f64 {
    (2.0 * mass * mu / FIELD_STRENGTH).sqrt() / charge.abs()
}

/// Least-squares circle through the points, as (centre x, centre y, radius).
pub fn fit_circle(x: &Array1<f64>, y: &Array1<f64>) -> Result<(f64, f64, f64), Error> {
    if x.len() != y.len() {
        return Err(Error::InconsistentShape {
            array_name: "y".to_string(),
            input_length: y.len(),
            expected_length: x.len(),
        });
    }
    if x.len() < 3 {
        return Err(Error::NotFound { what: "enough orbit samples to fit a circle".to_string() });
    }
    let (mx, my) = (x.mean().unwrap_or(0.0), y.mean().unwrap_or(0.0));
    let x = x - mx;
    let y = y - my;
    // x^2 + y^2 = a x + b y + c, solved through the normal equations
    let ones = Array1::<f64>::ones(x.len());
    let rhs = x.mapv(|v| v * v) + y.mapv(|v| v * v);
    let basis = [&x, &y, &ones];
    let mut normal = [[0.0; 3]; 3];
    let mut target = [0.0; 3];
    for i in 0..3 {
        for j in 0..3 {
            normal[i][j] = basis[i].dot(basis[j]);
        }
        target[i] = basis[i].dot(&rhs);
    }
    let det = det3(&normal);
    if det == 0.0 || !det.is_finite() {
        return Err(Error::Malformed("orbit samples are collinear".to_string()));
    }
    let mut solution = [0.0; 3];
    for (k, value) in solution.iter_mut().enumerate() {
        let mut replaced = normal;
        for (row, &t) in replaced.iter_mut().zip(target.iter()) {
            row[k] = t;
        }
        *value = det3(&replaced) / det;
    }
    let (cx, cy) = (solution[0] / 2.0, solution[1] / 2.0);
    Ok((cx + mx, cy + my, (solution[2] + cx * cx + cy * cy).sqrt()))
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ELECTRON_MASS;
    use approx::assert_relative_eq;

    #[test]
    fn circle_fit_recovers_an_arc() {
        let angle = Array1::linspace(0.0, 4.0, 50);
        let x = angle.mapv(|a| 1.5 + 0.2 * a.cos());
        let y = angle.mapv(|a| -3.0 + 0.2 * a.sin());
        let (cx, cy, radius) = fit_circle(&x, &y).unwrap();
        assert_relative_eq!(cx, 1.5, max_relative = 1e-9);
        assert_relative_eq!(cy, -3.0, max_relative = 1e-9);
        assert_relative_eq!(radius, 0.2, max_relative = 1e-9);
    }

    #[test]
    fn empty_initial_columns_are_not_found() {
        assert!(matches!(first_marker(Array1::zeros(0), "mass"), Err(Error::NotFound { .. })));
        assert_eq!(first_marker(array![2.0, 3.0], "mass").unwrap(), 2.0);
    }

    #[test]
    fn larmor_radius_of_the_test_electron() {
        let mu = magnetic_moment(ELECTRON_MASS, MARKER_ENERGY * ELEMENTARY_CHARGE, MARKER_PITCH);
        let radius = larmor_radius(ELECTRON_MASS, ELEMENTARY_CHARGE, mu);
        // p_perp / (e B) for a 100 MeV electron at pitch 0.5
        let rest_energy = ELECTRON_MASS * SPEED_OF_LIGHT.powi(2);
        let gamma = 1.0 + MARKER_ENERGY * ELEMENTARY_CHARGE / rest_energy;
        let p = ELECTRON_MASS * SPEED_OF_LIGHT * (gamma * gamma - 1.0).sqrt();
        let p_perp = p * (1.0 - MARKER_PITCH.powi(2)).sqrt();
        let expected = p_perp / (ELEMENTARY_CHARGE * FIELD_STRENGTH);
        assert_relative_eq!(radius, expected, max_relative = 1e-12);
        assert!(radius > 0.05 && radius < 0.06);
    }
}
