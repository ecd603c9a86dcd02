//! End-to-end: synthesize → train → save → load → classify requests.

use std::collections::BTreeMap;

use pollution_source::classifier::{ForestParams, SourceClassifier, SourcePredictor};
use pollution_source::data::loader::{load_dataset, write_dataset};
use pollution_source::data::split::train_test_split;
use pollution_source::data::synth::DatasetSynthesizer;
use pollution_source::spatial::{GeoElement, GeoPoint, StaticGeodata};
use pollution_source::{ClassifyResponse, Pipeline, SourceLabel};

fn trained() -> SourceClassifier {
    let dataset = DatasetSynthesizer::new(42).generate_dataset(100);
    let (train, _) = train_test_split(&dataset, 0.2, 42).unwrap();
    let params = ForestParams {
        n_trees: 30,
        ..ForestParams::default()
    };
    SourceClassifier::fit(&train, params).unwrap()
}

fn way(lat: f64, lon: f64, key: &str, value: &str) -> GeoElement {
    GeoElement::new(
        Some(GeoPoint::new(lat, lon).unwrap()),
        BTreeMap::from([(key.to_string(), value.to_string())]),
    )
}

#[test]
fn beats_chance_on_fresh_synthetic_data() {
    let model = trained();
    let fresh = DatasetSynthesizer::new(2024).generate_dataset(50);
    let report = model.evaluate(&fresh).unwrap();
    println!("{report}");
    assert!(report.accuracy > 0.6, "accuracy {}", report.accuracy);
    for label in SourceLabel::ALL {
        assert_eq!(report.metrics(label).support, 50);
    }
}

#[test]
fn held_out_split_report() {
    let dataset = DatasetSynthesizer::new(42).generate_dataset(100);
    let (train, test) = train_test_split(&dataset, 0.2, 42).unwrap();
    let model = SourceClassifier::fit(&train, ForestParams::default()).unwrap();
    let report = model.evaluate(&test).unwrap();
    assert_eq!(report.total, 60);
    assert!(report.accuracy > 0.6, "accuracy {}", report.accuracy);
}

#[test]
fn training_artifacts_round_trip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("pollution_labeled_data.csv");
    let model_path = dir.path().join("pollution_source_model.json");

    let dataset = DatasetSynthesizer::new(42).generate_dataset(40);
    write_dataset(&dataset, &data_path).unwrap();
    let reloaded = load_dataset(&data_path).unwrap();
    assert_eq!(reloaded.examples, dataset.examples);

    let params = ForestParams {
        n_trees: 10,
        ..ForestParams::default()
    };
    SourceClassifier::fit(&reloaded, params)
        .unwrap()
        .save(&model_path)
        .unwrap();

    let model = SourceClassifier::load(&model_path).unwrap();
    let label = model
        .predict(&[35.0, 55.0, 0.0, 10_000.0, 10_000.0, 10_000.0])
        .unwrap();
    assert!(SourceLabel::ALL.contains(&label));
}

#[test]
fn request_near_industrial_zone() {
    let model = trained();
    // ~60 m north of the point is an industrial yard; homes ~400 m away.
    let geodata = StaticGeodata::new(vec![
        way(40.00054, -74.0, "landuse", "industrial"),
        way(40.0036, -74.0, "landuse", "residential"),
        way(40.0002, -74.0, "highway", "primary"),
    ]);
    let pipeline = Pipeline::new(&geodata, &model, 1000.0);

    let request = r#"{"lat": 40.0, "lon": -74.0, "pollutants": {"pm2_5": 41, "no2": 28, "so2": 45}}"#;
    let mut out = Vec::new();
    let response = pipeline.run(request.as_bytes(), &mut out).unwrap();
    assert_eq!(response.source, SourceLabel::Industrial);

    let written: ClassifyResponse = serde_json::from_slice(&out).unwrap();
    assert_eq!(written, response);
}

#[test]
fn request_in_quiet_neighbourhood() {
    let model = trained();
    // Residential land use ~250 m away also sets the "road" distance.
    let geodata = StaticGeodata::new(vec![
        way(40.00225, -74.0, "landuse", "residential"),
        way(40.0081, -74.0, "landuse", "industrial"),
    ]);
    let pipeline = Pipeline::new(&geodata, &model, 1000.0);

    let request = r#"{"lat": 40.0, "lon": -74.0, "pollutants": {"pm2_5": 29, "no2": 19, "so2": 4}}"#;
    let response = pipeline.run(request.as_bytes(), Vec::new()).unwrap();
    assert_eq!(response.source, SourceLabel::Residential);
}
