use std::f64::consts::TAU;

use ndarray::{Array1, Zip};

use crate::constants::SPEED_OF_LIGHT;
use crate::orbit::OrbitKind;
use crate::Error;

/// SI inputs for evaluating guiding-center quantities, one entry per sample.
#[derive(Clone, Debug)]
pub struct GuidingCenterInput {
    pub mass: Array1<f64>,
    pub charge: Array1<f64>,
    pub r: Array1<f64>,
    pub phi: Array1<f64>,
    pub z: Array1<f64>,
    /// Magnetic moment [J/T].
    pub mu: Array1<f64>,
    pub vpar: Array1<f64>,
    /// Gyro-angle [rad].
    pub zeta: Array1<f64>,
    pub br: Array1<f64>,
    pub bphi: Array1<f64>,
    pub bz: Array1<f64>,
}

/// SI inputs for evaluating full-orbit quantities.
#[derive(Clone, Debug)]
pub struct ParticleInput {
    pub mass: Array1<f64>,
    pub charge: Array1<f64>,
    pub r: Array1<f64>,
    pub phi: Array1<f64>,
    pub z: Array1<f64>,
    pub vr: Array1<f64>,
    pub vphi: Array1<f64>,
    pub vz: Array1<f64>,
    pub br: Array1<f64>,
    pub bphi: Array1<f64>,
    pub bz: Array1<f64>,
}

/// SI inputs for evaluating field-line quantities.
#[derive(Clone, Debug)]
pub struct FieldLineInput {
    pub r: Array1<f64>,
    pub phi: Array1<f64>,
    pub z: Array1<f64>,
    pub br: Array1<f64>,
    pub bphi: Array1<f64>,
    pub bz: Array1<f64>,
}

/// Evaluates derived physical quantities for each kind of orbit data.
pub trait Evaluator {
    fn guiding_center(&self, key: &str, input: &GuidingCenterInput) -> Result<Array1<f64>, Error>;
    fn particle(&self, key: &str, input: &ParticleInput) -> Result<Array1<f64>, Error>;
    fn field_line(&self, key: &str, input: &FieldLineInput) -> Result<Array1<f64>, Error>;
}

/// Relativistic formulas in SI units.
#[derive(Clone, Copy, Debug, Default)]
pub struct Formulas;

const KINEMATIC_KEYS: [&str; 9] =
    ["vnorm", "gamma", "pnorm", "ppar", "pperp", "vpar", "ekin", "pitch", "mu"];

struct Kinematics {
    gamma: f64,
    vnorm: f64,
    vpar: f64,
    ppar: f64,
    pperp: f64,
    ekin: f64,
    mu: f64,
}

impl Kinematics {
    fn from_velocity(mass: f64, velocity: [f64; 3], field: [f64; 3]) -> Self {
        let c2 = SPEED_OF_LIGHT * SPEED_OF_LIGHT;
        let bnorm = norm(field);
        let v2 = velocity.iter().map(|v| v * v).sum::<f64>();
        let vpar = velocity.iter().zip(field.iter()).map(|(v, b)| v * b).sum::<f64>() / bnorm;
        let gamma = (1.0 - v2 / c2).sqrt().recip();
        let pperp = gamma * mass * (v2 - vpar * vpar).max(0.0).sqrt();
        Self {
            gamma,
            vnorm: v2.sqrt(),
            vpar,
            ppar: gamma * mass * vpar,
            pperp,
            // (gamma - 1) m c^2 without cancellation
            ekin: mass * v2 * gamma * gamma / (gamma + 1.0),
            mu: pperp * pperp / (2.0 * mass * bnorm),
        }
    }

    fn from_guiding_center(mass: f64, mu: f64, vpar: f64, field: [f64; 3]) -> Self {
        let c2 = SPEED_OF_LIGHT * SPEED_OF_LIGHT;
        let bnorm = norm(field);
        let beta_par2 = vpar * vpar / c2;
        let gamma2_minus_one = (2.0 * mu * bnorm / (mass * c2) + beta_par2) / (1.0 - beta_par2);
        let gamma = (1.0 + gamma2_minus_one).sqrt();
        let ppar = gamma * mass * vpar;
        let pperp = (2.0 * mass * mu * bnorm).sqrt();
        Self {
            gamma,
            vnorm: ppar.hypot(pperp) / (gamma * mass),
            vpar,
            ppar,
            pperp,
            ekin: mass * c2 * gamma2_minus_one / (gamma + 1.0),
            mu,
        }
    }

    fn get(&self, key: &str) -> f64 {
        let pnorm = self.ppar.hypot(self.pperp);
        match key {
            "vnorm" => self.vnorm,
            "gamma" => self.gamma,
            "pnorm" => pnorm,
            "ppar" => self.ppar,
            "pperp" => self.pperp,
            "vpar" => self.vpar,
            "ekin" => self.ekin,
            "pitch" => self.ppar / pnorm,
            "mu" => self.mu,
            _ => f64::NAN,
        }
    }
}

fn norm(vector: [f64; 3]) -> f64 {
    vector.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Quantities that depend only on position and field.
fn geometric(
    key: &str,
    r: &Array1<f64>,
    phi: &Array1<f64>,
    br: &Array1<f64>,
    bphi: &Array1<f64>,
    bz: &Array1<f64>,
) -> Option<Array1<f64>> {
    match key {
        "x" => Some(r * &phi.mapv(f64::cos)),
        "y" => Some(r * &phi.mapv(f64::sin)),
        "phimod" => Some(phi.mapv(|phi| phi.rem_euclid(TAU))),
        "bnorm" => Some(
            Zip::from(br)
                .and(bphi)
                .and(bz)
                .map_collect(|&br, &bphi, &bz| norm([br, bphi, bz])),
        ),
        _ => None,
    }
}

fn underivable(key: &str, kind: OrbitKind) -> Error {
    Error::Underivable { quantity: key.to_string(), kind }
}

impl Evaluator for Formulas {
    fn guiding_center(&self, key: &str, input: &GuidingCenterInput) -> Result<Array1<f64>, Error> {
        let geometry = geometric(key, &input.r, &input.phi, &input.br, &input.bphi, &input.bz);
        if let Some(values) = geometry {
            return Ok(values);
        }
        if !KINEMATIC_KEYS.contains(&key) {
            return Err(underivable(key, OrbitKind::GuidingCenter));
        }
        Ok(Array1::from_shape_fn(input.r.len(), |i| {
            let field = [input.br[i], input.bphi[i], input.bz[i]];
            Kinematics::from_guiding_center(input.mass[i], input.mu[i], input.vpar[i], field)
                .get(key)
        }))
    }

    fn particle(&self, key: &str, input: &ParticleInput) -> Result<Array1<f64>, Error> {
        let geometry = geometric(key, &input.r, &input.phi, &input.br, &input.bphi, &input.bz);
        if let Some(values) = geometry {
            return Ok(values);
        }
        if !KINEMATIC_KEYS.contains(&key) {
            return Err(underivable(key, OrbitKind::Particle));
        }
        Ok(Array1::from_shape_fn(input.r.len(), |i| {
            let velocity = [input.vr[i], input.vphi[i], input.vz[i]];
            let field = [input.br[i], input.bphi[i], input.bz[i]];
            Kinematics::from_velocity(input.mass[i], velocity, field).get(key)
        }))
    }

    fn field_line(&self, key: &str, input: &FieldLineInput) -> Result<Array1<f64>, Error> {
        geometric(key, &input.r, &input.phi, &input.br, &input.bphi, &input.bz)
            .ok_or_else(|| underivable(key, OrbitKind::FieldLine))
    }
}
