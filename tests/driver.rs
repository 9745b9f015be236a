#![cfg(unix)]

mod common;

use std::path::PathBuf;

use ndarray::{Array1, Array2};
use orbit_store::driver::DUMMY_TAG;
use orbit_store::regression::elementary::{larmor_radius, magnetic_moment, GyroMotion};
use orbit_store::regression::{execute, Phase};
use orbit_store::{
    Category, Error, InputMask, Payload, RunDriver, RunDriverDescriptor, RunOutput, Store,
};

use common::{temp_store, uniform_field};

fn driver(store: &Store, engine: &str) -> RunDriver<'_> {
    RunDriver::new(store, RunDriverDescriptor {
        engine: PathBuf::from(engine),
        working_dir: None,
        verbose: false,
    })
}

#[test]
fn placeholders_stand_in_for_missing_inputs() {
    let store = temp_store();
    let field = uniform_field();
    let dummy = store.create_group(Category::BField, "B_TC", &field, Some(DUMMY_TAG)).unwrap();
    store.create_group(Category::BField, "B_TC", &field, Some("OTHER")).unwrap();
    let empty = Payload::new();
    let markers = store.create_group(Category::Marker, "gc", &empty, Some("CASE")).unwrap();
    store.create_group(Category::Marker, "gc", &empty, Some(DUMMY_TAG)).unwrap();

    driver(&store, "true")
        .activate_inputs("CASE", InputMask::BFIELD | InputMask::MARKER)
        .unwrap();
    assert_eq!(store.active(Category::BField).unwrap(), Some(dummy));
    assert_eq!(store.active(Category::Marker).unwrap(), Some(markers));
}

#[test]
fn empty_tag_falls_back_to_placeholder() {
    let store = temp_store();
    let empty = Payload::new();
    let dummy = store.create_group(Category::Wall, "wall_2D", &empty, Some(DUMMY_TAG)).unwrap();
    store.create_group(Category::Wall, "wall_2D", &empty, None).unwrap();

    driver(&store, "true").activate_inputs("", InputMask::WALL).unwrap();
    assert_eq!(store.active(Category::Wall).unwrap(), Some(dummy));
}

#[test]
fn missing_placeholder_is_an_error() {
    let store = temp_store();
    let result = driver(&store, "true").activate_inputs("CASE", InputMask::EFIELD);
    assert!(matches!(result, Err(Error::NotFound { .. })));
}

#[test]
fn failing_engine_is_reported() {
    let store = temp_store();
    match driver(&store, "false").launch("CASE") {
        Err(Error::ExternalEngineFailure { status, .. }) => assert_eq!(status, Some(1)),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn engine_must_append_a_run() {
    let store = temp_store();
    store.create_group(Category::Options, "opt", &Payload::new(), Some("CASE")).unwrap();
    let result = driver(&store, "true").run("CASE", InputMask::OPTIONS);
    assert!(matches!(result, Err(Error::ExternalEngineFailure { status: Some(0), .. })));
}

fn gyro_run(radius: f64) -> RunOutput {
    let n = 101;
    let angle = Array1::linspace(0.0, 8.0, n);
    let ids = Array1::from_elem(n, 1i64);
    RunOutput {
        inistate: common::inistate(&[1, 2], orbit_store::constants::ELECTRON_MASS_AMU, 1),
        orbit: Payload::new()
            .with_ints("id", ids, None)
            .with_floats("time", Array1::linspace(0.0, 2.0e-9, n), Some("s"))
            .with_floats("r", angle.mapv(|a| 5.0 + radius * a.cos()), Some("m"))
            .with_floats("phi", Array1::from_elem(n, 90.0), Some("deg"))
            .with_floats("z", angle.mapv(|a| radius * a.sin()), Some("m"))
            .with_ints("charge", Array1::from_elem(n, 1i64), Some("e"))
            .with_floats("vr", Array1::zeros(n), Some("m/s"))
            .with_floats("vphi", Array1::zeros(n), Some("m/s"))
            .with_floats("vz", Array1::zeros(n), Some("m/s"))
            .with_floats("br", Array1::from_elem(n, 5.0), Some("T"))
            .with_floats("bphi", Array1::zeros(n), Some("T"))
            .with_floats("bz", Array1::zeros(n), Some("T")),
        distribution: Payload::new().with_floats("histogram", Array2::<f64>::zeros((2, 2)), None),
        ..RunOutput::default()
    }
}

#[test]
fn gyro_check_compares_against_larmor_radius() {
    use orbit_store::constants::{ELECTRON_MASS, ELEMENTARY_CHARGE};

    let mu = magnetic_moment(ELECTRON_MASS, 100.0e6 * ELEMENTARY_CHARGE, 0.5);
    let radius = larmor_radius(ELECTRON_MASS, ELEMENTARY_CHARGE, mu);

    for (scale, expected) in [(1.0, true), (1.05, false)] {
        let store = temp_store();
        let engine = driver(&store, "true");
        assert_eq!(execute(&GyroMotion, &store, &engine, &[Phase::Init], false).unwrap(), None);
        assert!(store.contains(Category::Mhd, DUMMY_TAG).unwrap());
        store.write_run(&gyro_run(radius * scale), Some(GyroMotion::TAG)).unwrap();

        let verdict = execute(&GyroMotion, &store, &engine, &[Phase::Check], false).unwrap();
        assert_eq!(verdict, Some(expected));
    }
}
