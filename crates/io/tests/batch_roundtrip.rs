use std::path::PathBuf;

use cmi_io::csv::{read_table, write_results, RESULT_COLUMNS};
use cmi_recon::{run_batch, FillerConfig, ModelBundle};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_bundle() -> ModelBundle {
    let dir = fixtures_dir();
    ModelBundle::load(&dir.join("model.json"), &dir.join("encoders.json")).unwrap()
}

#[test]
fn batch_file_produces_result_file_without_failed_rows() {
    let bundle = load_bundle();
    let table = read_table(&fixtures_dir().join("batch.csv")).unwrap();
    assert_eq!(table.len(), 10);
    assert_eq!(table.headers[0], "subject");

    let records = table.records();
    let mut filler = FillerConfig::default().build(bundle.imputation());
    let outcome = run_batch(&bundle, &records, filler.as_mut());
    assert_eq!(outcome.summary.succeeded, 9);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].index, 4);

    let mut out = Vec::new();
    write_results(&mut out, &table, &outcome).unwrap();

    let mut reader = csv::Reader::from_reader(out.as_slice());
    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(headers.len(), table.headers.len() + RESULT_COLUMNS.len());
    assert_eq!(&headers[headers.len() - 4..], &RESULT_COLUMNS);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 9);
    assert!(rows.iter().all(|r| &r[0] != "SUBJ_005"));

    // SUBJ_001: acc_z above the split, Male
    let first = &rows[0];
    assert_eq!(&first[0], "SUBJ_001");
    assert_eq!(&first[15], "1");
    let target: f64 = first[16].parse().unwrap();
    let non_target: f64 = first[17].parse().unwrap();
    let confidence: f64 = first[18].parse().unwrap();
    assert!((target - 0.8).abs() < 1e-9);
    assert!((non_target - 0.2).abs() < 1e-9);
    assert_eq!(confidence, target);

    // SUBJ_002: acc_z below the split, Female
    assert_eq!(&rows[1][15], "0");
}
