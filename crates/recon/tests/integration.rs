use std::collections::HashMap;
use std::path::PathBuf;

use cmi_recon::filler::{ConstantFill, FamilyRanges, SeededRangeFill};
use cmi_recon::{
    predict_record, reconcile, run_batch, BehaviorClass, CategoricalEncoding, FillStrategy,
    FillerConfig, InputRecord, LabelEncoder, ModelBundle, ReconError, Schema,
};
use proptest::prelude::*;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_bundle() -> ModelBundle {
    let dir = fixtures_dir();
    ModelBundle::load(&dir.join("model.json"), &dir.join("encoders.json")).unwrap()
}

/// The single-prediction form with its default values.
fn form_record() -> InputRecord {
    InputRecord::new()
        .with("acc_x", 0.856)
        .with("acc_y", -0.234)
        .with("acc_z", 9.123)
        .with("rot_w", 0.987)
        .with("rot_x", 0.123)
        .with("rot_y", -0.045)
        .with("rot_z", 0.067)
        .with("sex", "Male")
        .with("handedness", "Right")
        .with("adult_child", "Adult")
        .with("age", 28.0)
        .with("height_cm", 175.0)
        .with("shoulder_to_wrist_cm", 65.0)
        .with("elbow_to_wrist_cm", 28.0)
}

// -------------------------------------------------------------------------
// Scenarios
// -------------------------------------------------------------------------

#[test]
fn four_column_scenario_encodes_in_schema_order() {
    let schema = Schema::new(["acc_x", "acc_y", "acc_z", "sex"]).unwrap();
    let encodings =
        CategoricalEncoding::new().with("sex", LabelEncoder::new(["Male", "Female"]).unwrap());
    let record = InputRecord::new()
        .with("acc_x", 0.8)
        .with("acc_y", -0.2)
        .with("acc_z", 9.1)
        .with("sex", "Female");

    let v = reconcile(&record, &schema, &encodings, &mut ConstantFill(0.0)).unwrap();
    assert_eq!(v.values(), &[0.8, -0.2, 9.1, 1.0]);
    assert_eq!(v.schema().names(), schema.names());

    // acc_z missing -> default family range
    let partial = InputRecord::new().with("acc_x", 0.8).with("acc_y", -0.2).with("sex", "Female");
    let mut filler = SeededRangeFill::new(FamilyRanges::default(), 1234);
    let v = reconcile(&partial, &schema, &encodings, &mut filler).unwrap();
    assert_eq!(v.get("acc_x"), Some(0.8));
    assert_eq!(v.get("acc_y"), Some(-0.2));
    assert_eq!(v.get("sex"), Some(1.0));
    let acc_z = v.get("acc_z").unwrap();
    assert!((0.1..=1.0).contains(&acc_z), "acc_z = {acc_z}");

    let unknown = record.clone().with("sex", "Unknown");
    let err = reconcile(&unknown, &schema, &encodings, &mut ConstantFill(0.0)).unwrap_err();
    assert_eq!(err, ReconError::Encoding { column: "sex".into(), value: "Unknown".into() });
}

#[test]
fn form_defaults_predict_target_behavior() {
    let bundle = load_bundle();
    assert_eq!(bundle.meta().feature_count, 17);
    assert_eq!(bundle.meta().model_kind, "random_forest");

    let mut filler = FillerConfig::default().build(bundle.imputation());
    let result = predict_record(&bundle, &form_record(), filler.as_mut()).unwrap();
    assert_eq!(result.label, BehaviorClass::Target);
    assert!((result.target_probability() - 0.8).abs() < 1e-9);
    assert!((result.non_target_probability() - 0.2).abs() < 1e-9);
    assert!((result.confidence() - 0.8).abs() < 1e-9);
}

#[test]
fn imputation_values_fill_engineered_features() {
    let bundle = load_bundle();
    let mut filler = FillerConfig::default().build(bundle.imputation());
    let v = reconcile(&form_record(), bundle.schema(), bundle.encodings(), filler.as_mut()).unwrap();

    assert_eq!(v.get("thm_1_mean"), Some(0.95));
    assert_eq!(v.get("tof_1_mean"), Some(0.4));
    assert_eq!(v.get("acc_mag_std"), Some(0.3));
    // sklearn-style sorted classes: Female=0, Male=1; Left=0, Right=1; Adult=0, Child=1
    assert_eq!(v.get("sex"), Some(1.0));
    assert_eq!(v.get("handedness"), Some(1.0));
    assert_eq!(v.get("adult_child"), Some(0.0));
}

#[test]
fn random_fill_respects_family_ranges() {
    let bundle = load_bundle();
    let config = FillerConfig { strategy: FillStrategy::Random, seed: Some(7), ..Default::default() };
    let mut filler = config.build(&HashMap::new());
    let v = reconcile(&form_record(), bundle.schema(), bundle.encodings(), filler.as_mut()).unwrap();

    let thm = v.get("thm_1_mean").unwrap();
    let tof = v.get("tof_1_mean").unwrap();
    let other = v.get("acc_mag_std").unwrap();
    assert!((0.1..=2.0).contains(&thm), "thm = {thm}");
    assert!((0.01..=1.0).contains(&tof), "tof = {tof}");
    assert!((0.1..=1.0).contains(&other), "other = {other}");
}

#[test]
fn batch_with_one_bad_row_reports_one_failure() {
    let bundle = load_bundle();
    let records: Vec<InputRecord> = (0..10)
        .map(|i| {
            let record = form_record().with("acc_z", 8.6 + 0.1 * i as f64);
            if i == 4 {
                record.with("handedness", "Ambidextrous")
            } else {
                record
            }
        })
        .collect();

    let mut filler = FillerConfig::default().build(bundle.imputation());
    let outcome = run_batch(&bundle, &records, filler.as_mut());

    assert_eq!(outcome.rows.len(), 9);
    assert_eq!(outcome.summary.failed, 1);
    assert_eq!(outcome.failures[0].index, 4);
    assert!(outcome.failures[0].message.contains("Ambidextrous"));
    assert!(outcome.rows.windows(2).all(|w| w[0].index < w[1].index));
}

#[test]
fn model_load_failure_is_reported_not_panicked() {
    let dir = fixtures_dir();
    let err = ModelBundle::load(&dir.join("missing.json"), &dir.join("encoders.json")).err().unwrap();
    assert_eq!(err.kind(), "model_load");
}

// -------------------------------------------------------------------------
// Properties
// -------------------------------------------------------------------------

fn schema_and_record() -> impl Strategy<Value = (Vec<String>, Vec<f64>)> {
    prop::collection::btree_set("[a-z]{1,6}_[0-9]{1,2}", 1..24).prop_flat_map(|names| {
        let names: Vec<String> = names.into_iter().collect();
        let n = names.len();
        (Just(names), prop::collection::vec(-1.0e6f64..1.0e6, n))
    })
}

proptest! {
    #[test]
    fn complete_records_round_trip_in_schema_order((names, values) in schema_and_record()) {
        let schema = Schema::new(names.clone()).unwrap();
        let record: InputRecord = names.iter().cloned().zip(values.iter().copied()).collect();

        let v = reconcile(&record, &schema, &CategoricalEncoding::new(), &mut ConstantFill(f64::NAN)).unwrap();
        prop_assert_eq!(v.schema().names(), &names[..]);
        prop_assert_eq!(v.values(), &values[..]);
    }

    #[test]
    fn partial_records_are_always_full_width(
        (names, values) in schema_and_record(),
        keep in prop::collection::vec(any::<bool>(), 24),
        seed in any::<u64>(),
    ) {
        let schema = Schema::new(names.clone()).unwrap();
        let record: InputRecord = names
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .zip(keep.iter())
            .filter(|(_, k)| **k)
            .map(|(pair, _)| pair)
            .collect();

        let ranges = FamilyRanges::default();
        let mut filler = SeededRangeFill::new(ranges.clone(), seed);
        let v = reconcile(&record, &schema, &CategoricalEncoding::new(), &mut filler).unwrap();
        prop_assert_eq!(v.len(), names.len());
        for (name, value) in v.iter() {
            if !record.contains(name) {
                prop_assert!(ranges.range_for(name).contains(value), "{} = {}", name, value);
            }
        }
    }
}
