mod common;

use std::collections::HashSet;

use ndarray::array;
use orbit_store::marker::FieldLineMarkers;
use orbit_store::store::QID_DIGITS;
use orbit_store::{Category, Error, MarkerPopulation, Payload, RunOutput, Values};
use proptest::prelude::*;

use common::{temp_store, uniform_field};

#[test]
fn tagged_field_resolves_and_activates() {
    let store = temp_store();
    let field = uniform_field();
    let other = store.create_group(Category::BField, "B_TC", &field, Some("OTHER")).unwrap();
    let qid = store.create_group(Category::BField, "field-uniform", &field, Some("TEST")).unwrap();

    assert_eq!(store.resolve(Category::BField, "TEST").unwrap(), qid);
    store.activate(Category::BField, &other).unwrap();
    store.activate(Category::BField, &qid).unwrap();

    let listing = store.list_groups(Category::BField).unwrap();
    let active: Vec<_> =
        listing.iter().filter(|g| g.active).map(|g| g.meta.qid.as_str()).collect();
    assert_eq!(active, vec![qid.as_str()]);
    let uniform = listing.iter().find(|g| g.meta.qid == qid).unwrap();
    assert_eq!(uniform.meta.type_name, "field-uniform");
    assert_eq!(uniform.meta.description, "TEST");
}

#[test]
fn new_groups_become_active() {
    let store = temp_store();
    assert_eq!(store.active(Category::EField).unwrap(), None);
    let qid = store.create_group(Category::EField, "E_TC", &Payload::new(), None).unwrap();
    assert_eq!(store.active(Category::EField).unwrap(), Some(qid));
    store.deactivate(Category::EField).unwrap();
    assert_eq!(store.active(Category::EField).unwrap(), None);
}

#[test]
fn listing_is_ordered_by_creation() {
    let store = temp_store();
    let created: Vec<_> = (0..4)
        .map(|i| {
            let description = format!("w{}", i);
            let payload = Payload::new();
            store
                .create_group(Category::Wall, "wall_2D", &payload, Some(description.as_str()))
                .unwrap()
        })
        .collect();
    let listing = store.list_groups(Category::Wall).unwrap();
    assert_eq!(listing.iter().map(|g| g.meta.qid.clone()).collect::<Vec<_>>(), created);
    for pair in listing.windows(2) {
        assert!(pair[0].meta.date < pair[1].meta.date);
    }
}

#[test]
fn newest_description_match_wins() {
    let store = temp_store();
    let create = |description| {
        store
            .create_group(Category::Plasma, "plasma_1D", &Payload::new(), Some(description))
            .unwrap()
    };
    let older = create("ITER baseline");
    let newer = create("ITER baseline");
    assert_eq!(store.resolve(Category::Plasma, "ITER baseline").unwrap(), newer);
    assert_eq!(store.resolve(Category::Plasma, "ITER").unwrap(), newer);
    assert_eq!(store.resolve(Category::Plasma, &older).unwrap(), older);
}

#[test]
fn exact_description_beats_newer_tag_match() {
    let store = temp_store();
    let field = uniform_field();
    let exact = store.create_group(Category::BField, "B_TC", &field, Some("TEST")).unwrap();
    let tagged = store
        .create_group(Category::BField, "B_TC", &field, Some("test of something else"))
        .unwrap();

    assert_eq!(store.resolve(Category::BField, "TEST").unwrap(), exact);
    assert_eq!(store.resolve(Category::BField, "test of something else").unwrap(), tagged);
}

#[test]
fn empty_tag_names_no_group() {
    let store = temp_store();
    store.create_group(Category::Mhd, "MHD_STAT", &Payload::new(), None).unwrap();

    assert!(matches!(
        store.resolve(Category::Mhd, ""),
        Err(Error::AmbiguousOrNotFound { category: Category::Mhd, .. })
    ));
    assert!(!store.contains(Category::Mhd, "").unwrap());
}

#[test]
fn failed_writes_leave_no_group_behind() {
    let store = temp_store();
    let empty = Payload::new();
    let kept = store.create_group(Category::Wall, "wall_2D", &empty, Some("KEPT")).unwrap();
    let before = store.list_groups(Category::Wall).unwrap();

    let unnamed = Payload::new().with_floats("", array![1.0], None);
    assert!(matches!(
        store.create_group(Category::Wall, "wall_2D", &unnamed, Some("BROKEN")),
        Err(Error::Malformed(_))
    ));
    let nested = Payload::new().with_floats("a/b", array![1.0], None);
    assert!(matches!(
        store.create_group(Category::Wall, "wall_2D", &nested, Some("BROKEN")),
        Err(Error::Malformed(_))
    ));

    assert_eq!(store.list_groups(Category::Wall).unwrap(), before);
    assert_eq!(store.active(Category::Wall).unwrap(), Some(kept));
    assert!(!store.contains(Category::Wall, "BROKEN").unwrap());
    store.create_group(Category::Wall, "wall_2D", &empty, Some("AFTER")).unwrap();
}

#[test]
fn missing_groups_are_reported() {
    let store = temp_store();
    store.create_group(Category::Marker, "gc", &Payload::new(), Some("KNOWN")).unwrap();

    let unknown = "0000000000";
    assert!(matches!(store.read_group(Category::Marker, unknown), Err(Error::NotFound { .. })));
    assert!(matches!(store.activate(Category::Marker, unknown), Err(Error::NotFound { .. })));
    assert!(matches!(
        store.resolve(Category::Marker, "UNKNOWN"),
        Err(Error::AmbiguousOrNotFound { category: Category::Marker, .. })
    ));
    assert!(!store.contains(Category::Marker, "UNKNOWN").unwrap());
    assert!(store.contains(Category::Marker, "KNOWN").unwrap());
    assert!(!store.contains(Category::Neutral, "KNOWN").unwrap());
}

#[test]
fn manual_identifiers_must_be_unique() {
    let store = temp_store();
    store
        .create_group_with_qid(Category::Options, "opt", "1234567890", &Payload::new(), None)
        .unwrap();
    let clash =
        store.create_group_with_qid(Category::Wall, "wall_2D", "1234567890", &Payload::new(), None);
    assert!(matches!(clash, Err(Error::DuplicateIdentifier(qid)) if qid == "1234567890"));
    assert!(matches!(
        store.create_group_with_qid(Category::Wall, "wall_2D", "12-34", &Payload::new(), None),
        Err(Error::Malformed(_))
    ));
}

#[test]
fn payload_survives_storage() {
    let store = temp_store();
    let payload = Payload::new()
        .with_floats("bxyz", array![5.0, 0.0, 0.0], Some("T"))
        .with_floats("jacobian", ndarray::Array2::<f64>::eye(3), Some("T/m"))
        .with_int_scalar("n", 3, None);
    let qid = store.create_group(Category::BField, "B_TC", &payload, Some("round trip")).unwrap();

    let group = store.read_group(Category::BField, &qid).unwrap();
    assert_eq!(group.payload, payload);
    assert_eq!(group.meta.qid, qid);
    assert_eq!(group.meta.tag(), "ROUND");
    assert!(matches!(group.payload.get("n").map(|c| &c.values), Some(Values::Int(_))));
}

#[test]
fn runs_record_their_inputs() {
    let store = temp_store();
    let tag = Some("LINEAGE");
    let field = store.create_group(Category::BField, "B_TC", &uniform_field(), tag).unwrap();
    let wall = store.create_group(Category::Wall, "wall_2D", &Payload::new(), tag).unwrap();
    store.deactivate(Category::Wall).unwrap();

    let output = RunOutput {
        inistate: common::inistate(&[1], 1.0, 1),
        orbit: common::field_line_orbit(&[1], &[0.0]),
        ..RunOutput::default()
    };
    let run = common::write_run(&store, &output, "LINEAGE");
    let parents = store.parents(&run).unwrap();
    assert_eq!(parents.get(&Category::BField), Some(&field));
    assert!(!parents.values().any(|qid| *qid == wall));

    let data = store.read_run(&run).unwrap();
    assert_eq!(data.parents, parents);
    assert_eq!(data.orbit_kind, Some(orbit_store::OrbitKind::FieldLine));
    assert_eq!(store.resolve(Category::Results, "LINEAGE").unwrap(), run);

    store.set_orbit_kind(&run, orbit_store::OrbitKind::Particle).unwrap();
    assert_eq!(store.read_run(&run).unwrap().orbit_kind, Some(orbit_store::OrbitKind::Particle));
}

#[test]
fn ragged_markers_are_not_written() {
    let store = temp_store();
    let markers = MarkerPopulation::FieldLine(FieldLineMarkers {
        ids: array![1, 2],
        r: array![6.0, 6.0],
        phi: array![0.0, 0.0],
        z: array![0.0],
        pitch: array![1.0, 1.0],
        weight: array![1.0, 1.0],
        time: array![0.0, 0.0],
    });
    assert!(matches!(
        store.create_markers(&markers, Some("RAGGED")),
        Err(Error::InconsistentShape { input_length: 1, expected_length: 2, .. })
    ));
    assert!(store.list_groups(Category::Marker).unwrap().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn identifiers_are_unique(count in 1usize..8) {
        let store = temp_store();
        let qids: Vec<String> = (0..count)
            .map(|i| {
                let category = Category::INPUTS[i % Category::INPUTS.len()];
                store.create_group(category, "any", &Payload::new(), None).unwrap()
            })
            .collect();
        let unique: HashSet<_> = qids.iter().collect();
        prop_assert_eq!(unique.len(), count);
        for qid in &qids {
            prop_assert_eq!(qid.len(), QID_DIGITS);
            prop_assert!(qid.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn at_most_one_group_is_active(picks in prop::collection::vec(0usize..4, 1..10)) {
        let store = temp_store();
        let qids: Vec<String> = (0..4)
            .map(|_| store.create_group(Category::Neutral, "N0_1D", &Payload::new(), None).unwrap())
            .collect();
        for &pick in &picks {
            store.activate(Category::Neutral, &qids[pick]).unwrap();
            let active: Vec<_> = store
                .list_groups(Category::Neutral)
                .unwrap()
                .into_iter()
                .filter(|g| g.active)
                .map(|g| g.meta.qid)
                .collect();
            prop_assert_eq!(active, vec![qids[pick].clone()]);
        }
    }
}
