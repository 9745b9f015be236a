//! Quantity names and their accepted spellings.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::Error;

/// Canonical keys, each followed by the additional spellings that resolve to it.
///
/// Spellings are written in normalized form (see `normalize`).
const ALIASES: &[(&str, &[&str])] = &[
    ("id", &["ids", "markerid"]),
    ("time", &["t"]),
    ("mileage", &[]),
    ("cputime", &[]),
    ("r", &["rgc", "majorradius"]),
    ("phi", &["phigc", "toroidalangle"]),
    ("z", &["zgc"]),
    ("rprt", &["rparticle"]),
    ("phiprt", &["phiparticle"]),
    ("zprt", &["zparticle"]),
    ("phimod", &[]),
    ("x", &[]),
    ("y", &[]),
    ("vr", &[]),
    ("vphi", &[]),
    ("vz", &[]),
    ("vpar", &["vparallel"]),
    ("vnorm", &["v", "speed", "velocity"]),
    ("ppar", &["pparallel"]),
    ("pperp", &["pperpendicular"]),
    ("pnorm", &["p", "momentum"]),
    ("br", &[]),
    ("bphi", &[]),
    ("bz", &[]),
    ("bnorm", &["b", "babs"]),
    ("mu", &["magneticmoment"]),
    ("ekin", &["energy", "kineticenergy"]),
    ("gamma", &["lorentzfactor"]),
    ("pitch", &["xi"]),
    ("zeta", &["gyroangle", "gyrophase"]),
    ("theta", &["poloidalangle"]),
    ("rho", &[]),
    ("mass", &["m"]),
    ("charge", &["q"]),
    ("anum", &[]),
    ("znum", &[]),
    ("weight", &[]),
    ("endcond", &["endcondition"]),
    ("errormsg", &[]),
    ("errorline", &[]),
    ("errormod", &[]),
    ("walltile", &[]),
];

lazy_static! {
    static ref ALIAS_TABLE: HashMap<&'static str, &'static str> = ALIASES
        .iter()
        .flat_map(|&(key, spellings)| {
            std::iter::once((key, key))
                .chain(spellings.iter().map(move |&spelling| (spelling, key)))
        })
        .collect();
}

/// Lower-cases the name, drops a trailing unit in brackets or parentheses,
/// and removes whitespace, underscores and hyphens.
fn normalize(name: &str) -> String {
    let name = match name.find(|c| c == '[' || c == '(') {
        Some(start) => &name[..start],
        None => name,
    };
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Maps any accepted spelling of a quantity to its canonical key.
pub fn canonicalize(name: &str) -> Result<&'static str, Error> {
    ALIAS_TABLE
        .get(normalize(name).as_str())
        .copied()
        .ok_or_else(|| Error::UnknownQuantity(name.to_string()))
}

/// All canonical keys.
pub fn canonical_keys() -> impl Iterator<Item = &'static str> {
    ALIASES.iter().map(|&(key, _)| key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_spellings_resolve() {
        assert_eq!(canonicalize("B_R").unwrap(), "br");
        assert_eq!(canonicalize("v_phi").unwrap(), "vphi");
        assert_eq!(canonicalize("R").unwrap(), "r");
        assert_eq!(canonicalize("Energy [eV]").unwrap(), "ekin");
        assert_eq!(canonicalize("E_kin (J)").unwrap(), "ekin");
        assert_eq!(canonicalize("ids").unwrap(), "id");
        assert_eq!(canonicalize("gyro angle").unwrap(), "zeta");
    }

    #[test]
    fn canonical_keys_are_fixed_points() {
        for key in canonical_keys() {
            assert_eq!(canonicalize(key).unwrap(), key);
        }
    }

    #[test]
    fn unknown_names_fail() {
        assert!(matches!(
            canonicalize("flux"),
            Err(Error::UnknownQuantity(name)) if name == "flux"
        ));
        assert!(canonicalize("").is_err());
    }
}
