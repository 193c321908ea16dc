//! Integration tests for the posvm library
//!
//! These tests run the pipeline stages end to end on a synthetic player
//! table and check the properties every run must satisfy.

use posvm::data::{engineer, Dataset, FeatureConfig, Position};
use posvm::kernel::KernelKind;
use posvm::model_selection::GridSearch;
use posvm::persistence::ModelStore;
use posvm::pipeline::{self, FinalModel, PipelineConfig};
use posvm::{Classifier, SVMError};
use std::fmt::Write as _;
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

/// Per-position profile: (Pos, FG%, TRB, AST, STL, BLK, PTS)
const PROFILES: [(&str, f64, f64, f64, f64, f64, f64); 5] = [
    ("PG", 0.43, 3.5, 7.5, 1.4, 0.2, 16.0),
    ("SG", 0.44, 3.8, 3.5, 1.1, 0.3, 15.0),
    ("SF", 0.46, 5.5, 2.4, 1.0, 0.5, 12.0),
    ("PF", 0.49, 7.5, 1.9, 0.7, 0.9, 11.0),
    ("C", 0.56, 10.0, 1.5, 0.6, 1.6, 10.0),
];

/// Deterministic player table; every sixth player per position plays under 15 minutes
fn synthetic_csv(per_position: usize) -> String {
    let mut csv = String::from("Player,Pos,Age,Tm,G,MP,FG%,TRB,AST,STL,BLK,PTS\n");
    for i in 0..per_position {
        for (p, &(pos, fg, trb, ast, stl, blk, pts)) in PROFILES.iter().enumerate() {
            let jitter = ((i * 7 + p * 13) % 10) as f64 / 10.0 - 0.45;
            let mp = if i % 6 == 5 {
                9.0 + jitter
            } else {
                22.0 + 10.0 * jitter
            };
            // Some point guards without a block exercise the zero-denominator rule
            let blk = if pos == "PG" && i % 4 == 0 {
                0.0
            } else {
                blk * (1.0 + 0.3 * jitter)
            };
            writeln!(
                csv,
                "Player {p}-{i},{pos},{},T{},{},{mp:.1},{:.3},{:.1},{:.1},{:.1},{blk:.1},{:.1}",
                20 + (i * 3 + p) % 15,
                i % 30,
                40 + (i * 11 + p * 5) % 42,
                fg + 0.02 * jitter,
                trb * (1.0 + 0.25 * jitter),
                ast * (1.0 - 0.25 * jitter),
                stl * (1.0 + 0.2 * jitter),
                pts * (1.0 + 0.3 * jitter),
            )
            .expect("Failed to format row");
        }
    }
    csv
}

fn synthetic_dataset() -> Dataset {
    Dataset::from_reader(Cursor::new(synthetic_csv(30))).expect("Synthetic CSV should load")
}

/// Defaults with a reduced grid so the tests stay fast
fn test_config(dir: &Path) -> PipelineConfig {
    PipelineConfig {
        model_path: dir.join("svm_model.json"),
        grid: GridSearch {
            c_values: vec![0.1, 1.0, 10.0],
            kernels: vec![KernelKind::Linear, KernelKind::Rbf],
            ..GridSearch::default()
        },
        ..PipelineConfig::default()
    }
}

#[test]
fn test_feature_engineering_properties() {
    let dataset = synthetic_dataset();
    let (x, y) = engineer(&dataset, &FeatureConfig::default()).expect("Engineering should succeed");

    // 5 of every 6 players per position pass the minutes filter
    assert_eq!(x.n_rows(), 125);
    assert_eq!(y.len(), 125);

    let mp = x.column_index("MP").unwrap();
    assert!(x.rows().iter().all(|row| row[mp] >= 15.0));

    for name in ["Player", "Age", "Tm", "Pos"] {
        assert!(x.column_index(name).is_none(), "{name} should be dropped");
    }

    for (ratio, num, den) in [("AST/PTS", "AST", "PTS"), ("TRB/AST", "TRB", "AST"), ("STL/BLK", "STL", "BLK")] {
        let r = x.column_index(ratio).unwrap();
        let n = x.column_index(num).unwrap();
        let d = x.column_index(den).unwrap();
        for row in x.rows() {
            if row[d] == 0.0 {
                assert_eq!(row[r], 0.0);
            } else {
                assert_eq!(row[r], row[n] / row[d]);
            }
        }
    }
    let stl_blk = x.column_index("STL/BLK").unwrap();
    assert!(x.rows().iter().any(|row| row[stl_blk] == 0.0));

    let codes = y.codes();
    assert!(codes.iter().all(|c| (1..=5).contains(c)));
    for position in Position::ALL {
        assert_eq!(y.positions().iter().filter(|&&p| p == position).count(), 25);
    }
}

#[test]
fn test_stage_properties() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(dir.path());
    let dataset = synthetic_dataset();
    let (x, y) = engineer(&dataset, &config.features).unwrap();

    let selection = pipeline::select_features(&x, &y, &config).unwrap();
    for name in selection.features.columns() {
        assert!(x.columns().contains(name));
        assert!(selection.scores.get(name).unwrap() > config.mi_threshold);
    }
    for (name, score) in selection.scores.entries() {
        if !selection.features.columns().contains(name) {
            assert!(*score <= config.mi_threshold);
        }
    }

    let training = pipeline::train(&selection.features, &y, &config).unwrap();
    assert_eq!(training.split.train.len(), 93);
    assert_eq!(training.split.test.len(), 32);
    assert!(training
        .split
        .train
        .iter()
        .all(|i| !training.split.test.contains(i)));

    // Scaled training columns: mean 0, population std 1
    for j in 0..selection.features.n_cols() {
        let col: Vec<f64> = training.x_train.iter().map(|r| r[j]).collect();
        let mean = col.iter().sum::<f64>() / col.len() as f64;
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / col.len() as f64;
        assert!(mean.abs() < 1e-9, "column {j} mean {mean}");
        assert!((var.sqrt() - 1.0).abs() < 1e-9 || var == 0.0, "column {j} std {}", var.sqrt());
    }

    let evaluation = pipeline::evaluate(&training, &selection.features, &y, &config).unwrap();
    assert_eq!(evaluation.cv_scores.len(), 10);
    assert!((0.0..=1.0).contains(&evaluation.cv_mean));
    assert_eq!(evaluation.confusion.total(), training.y_test.len());
    assert_eq!(
        evaluation.confusion.row_totals().iter().sum::<usize>(),
        evaluation.confusion.column_totals().iter().sum::<usize>()
    );
    assert!((evaluation.confusion.accuracy() - evaluation.test_accuracy).abs() < 1e-12);
    assert!(evaluation.train_accuracy > 0.6, "got {}", evaluation.train_accuracy);
}

#[test]
fn test_end_to_end_is_reproducible() {
    let dataset = synthetic_dataset();
    let first_dir = TempDir::new().expect("Failed to create temp dir");
    let second_dir = TempDir::new().expect("Failed to create temp dir");

    let a = pipeline::run_dataset(&dataset, &test_config(first_dir.path())).unwrap();
    let b = pipeline::run_dataset(&dataset, &test_config(second_dir.path())).unwrap();

    assert_eq!(a.mi_scores, b.mi_scores);
    assert_eq!(a.selected_features, b.selected_features);
    assert_eq!(a.best, b.best);
    assert_eq!(a.evaluation.train_accuracy, b.evaluation.train_accuracy);
    assert_eq!(a.evaluation.test_accuracy, b.evaluation.test_accuracy);
    assert_eq!(a.evaluation.cv_scores, b.evaluation.cv_scores);
    assert_eq!(a.evaluation.confusion, b.evaluation.confusion);
    assert_eq!(a.to_string(), b.to_string());
}

#[test]
fn test_first_run_without_model_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(dir.path());
    assert!(!config.model_path.exists());

    let report = pipeline::run_dataset(&synthetic_dataset(), &config).unwrap();
    assert!(report.previous_test_accuracy.is_none());
    assert!(config.model_path.exists());
}

#[test]
fn test_saved_model_matches_report() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(dir.path());
    let dataset = synthetic_dataset();

    let first = pipeline::run_dataset(&dataset, &config).unwrap();
    let saved = ModelStore::new(&config.model_path).load().unwrap();
    assert_eq!(saved.features, first.selected_features);
    assert_eq!(saved.params, first.final_params);
    assert_eq!(saved.metadata.test_accuracy, Some(first.evaluation.test_accuracy));

    // The rebuilt model reproduces the reported test accuracy on the same split
    let (x, y) = engineer(&dataset, &config.features).unwrap();
    let x = x.select_named(&saved.features).unwrap();
    let training = pipeline::train(&x, &y, &config).unwrap();
    let model = saved.to_trained_model().unwrap();
    let x_test = saved
        .scaler
        .transform(&posvm::model_selection::take(x.rows(), &training.split.test))
        .unwrap();
    assert_eq!(model.accuracy(&x_test, &training.y_test), first.evaluation.test_accuracy);

    // A second run scores the file written by the first
    let second = pipeline::run_dataset(&dataset, &config).unwrap();
    assert_eq!(second.previous_test_accuracy, Some(first.evaluation.test_accuracy));
}

#[test]
fn test_corrupt_model_file_is_replaced() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(dir.path());
    std::fs::write(&config.model_path, "{ not a model").unwrap();

    let report = pipeline::run_dataset(&synthetic_dataset(), &config).unwrap();
    assert!(report.previous_test_accuracy.is_none());
    assert!(ModelStore::new(&config.model_path).load().is_ok());
}

#[test]
fn test_tuned_final_model() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = PipelineConfig {
        final_model: FinalModel::Tuned,
        ..test_config(dir.path())
    };

    let report = pipeline::run_dataset(&synthetic_dataset(), &config).unwrap();
    assert_eq!(report.final_params, report.best.params);
}

#[test]
fn test_fixed_final_model_ignores_grid() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(dir.path());

    let report = pipeline::run_dataset(&synthetic_dataset(), &config).unwrap();
    assert_eq!(report.final_params, config.final_params);
    assert_eq!(report.final_params.kernel, KernelKind::Linear);
    assert_eq!(report.final_params.c, 0.3);
}

#[test]
fn test_scaled_cross_validation() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = PipelineConfig {
        scale_cv: true,
        ..test_config(dir.path())
    };

    let report = pipeline::run_dataset(&synthetic_dataset(), &config).unwrap();
    assert_eq!(report.evaluation.cv_scores.len(), 10);
    assert!(report.evaluation.cv_scores.iter().all(|s| (0.0..=1.0).contains(s)));
}

#[test]
fn test_run_from_file_and_report_format() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let data_path = dir.path().join("nba2021.csv");
    std::fs::write(&data_path, synthetic_csv(30)).unwrap();
    let config = PipelineConfig {
        data_path,
        ..test_config(dir.path())
    };

    let report = pipeline::run(&config).unwrap();
    assert_eq!(report.n_records, 150);
    assert_eq!(report.n_rows, 125);

    let text = report.to_string();
    assert!(text.contains("Best Model: SVC(C="));
    assert!(text.contains(&format!(
        "Test set accuracy: {:.3}",
        report.evaluation.test_accuracy
    )));
    assert!(text.contains(&format!(
        "Average Cross-Validation Score: {:.2}",
        report.evaluation.cv_mean
    )));
    assert!(text.contains("Confusion Matrix:"));
    assert!(text.lines().last().unwrap().starts_with("All"));
}

#[test]
fn test_load_errors() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = PipelineConfig {
        data_path: dir.path().join("missing.csv"),
        ..test_config(dir.path())
    };
    assert!(matches!(pipeline::run(&config), Err(SVMError::IoError(_))));

    let no_blk = "Player,Pos,Age,Tm,MP,PTS,AST,TRB,STL\nA,PG,25,BOS,30,10,5,3,1\n";
    assert!(matches!(
        Dataset::from_reader(Cursor::new(no_blk)),
        Err(SVMError::MissingColumn(_))
    ));
}

#[test]
fn test_unknown_position_aborts_run() {
    let mut csv = synthetic_csv(30);
    csv.push_str("Hybrid,SG-PG,27,TOT,60,30.0,0.450,4.0,5.0,1.2,0.3,15.0\n");
    let dataset = Dataset::from_reader(Cursor::new(csv)).unwrap();
    let dir = TempDir::new().expect("Failed to create temp dir");

    let result = pipeline::run_dataset(&dataset, &test_config(dir.path()));
    assert!(matches!(result, Err(SVMError::UnknownPosition(ref p)) if p == "SG-PG"));
    assert!(!dir.path().join("svm_model.json").exists());
}
