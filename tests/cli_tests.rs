//! Integration tests for the CLI application
//!
//! These tests run the compiled binary against a synthetic player table.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::{NamedTempFile, TempDir};

/// Helper to create test data files
struct TestDataFiles {
    pub csv_file: NamedTempFile,
    pub config_file: NamedTempFile,
    pub bad_csv_file: NamedTempFile,
}

impl TestDataFiles {
    fn new() -> std::io::Result<Self> {
        // Player statistics, 20 per position, 4 of them under the minutes cutoff
        let profiles = [
            ("PG", 3.5, 7.5, 0.2, 16.0),
            ("SG", 3.8, 3.5, 0.3, 15.0),
            ("SF", 5.5, 2.4, 0.5, 12.0),
            ("PF", 7.5, 1.9, 0.9, 11.0),
            ("C", 10.0, 1.5, 1.6, 10.0),
        ];
        let mut rows = String::from("Player,Pos,Age,Tm,G,MP,TRB,AST,STL,BLK,PTS\n");
        for i in 0..20 {
            for (p, (pos, trb, ast, blk, pts)) in profiles.iter().enumerate() {
                let jitter = ((i * 3 + p * 7) % 10) as f64 / 10.0 - 0.45;
                let mp = if i % 5 == 4 { 8.0 } else { 25.0 + 8.0 * jitter };
                writeln!(
                    rows,
                    "P{p}x{i},{pos},{},T{},{},{mp:.1},{:.1},{:.1},{:.1},{:.1},{:.1}",
                    21 + i % 12,
                    i % 6,
                    50 + i,
                    trb * (1.0 + 0.2 * jitter),
                    ast * (1.0 - 0.2 * jitter),
                    1.0 + 0.1 * jitter,
                    blk * (1.0 + 0.2 * jitter),
                    pts * (1.0 + 0.2 * jitter),
                )
                .expect("Failed to format row");
            }
        }

        let mut csv_file = NamedTempFile::with_suffix(".csv")?;
        csv_file.write_all(rows.as_bytes())?;
        csv_file.flush()?;

        // Reduced grid keeps the runs short
        let mut config_file = NamedTempFile::with_suffix(".json")?;
        writeln!(
            config_file,
            r#"{{ "grid": {{ "c_values": [0.1, 1.0], "kernels": ["linear", "rbf"] }} }}"#
        )?;
        config_file.flush()?;

        // Missing the BLK column
        let mut bad_csv_file = NamedTempFile::with_suffix(".csv")?;
        writeln!(bad_csv_file, "Player,Pos,Age,Tm,MP,TRB,AST,STL,PTS")?;
        writeln!(bad_csv_file, "A,PG,25,BOS,30.0,4.0,8.0,1.5,16.0")?;
        bad_csv_file.flush()?;

        Ok(TestDataFiles {
            csv_file,
            config_file,
            bad_csv_file,
        })
    }
}

/// Get the path to the compiled CLI binary
fn get_cli_binary_path() -> &'static str {
    env!("CARGO_BIN_EXE_posvm")
}

fn run_pipeline(test_data: &TestDataFiles, model_path: &Path, extra: &[&str]) -> Output {
    let mut args = vec![
        "--data",
        test_data.csv_file.path().to_str().unwrap(),
        "--model",
        model_path.to_str().unwrap(),
        "--config",
        test_data.config_file.path().to_str().unwrap(),
    ];
    args.extend_from_slice(extra);

    Command::new(get_cli_binary_path())
        .args(&args)
        .output()
        .expect("Failed to run CLI")
}

fn line_value<'a>(stdout: &'a str, prefix: &str) -> &'a str {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix(prefix))
        .unwrap_or_else(|| panic!("No line starting with {prefix:?} in:\n{stdout}"))
        .trim()
}

#[test]
fn test_cli_run_pipeline() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("svm_model.json");

    let output = run_pipeline(&test_data, &model_path, &[]);
    assert!(
        output.status.success(),
        "Pipeline failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(model_path.exists(), "Model file was not created");

    let stdout = String::from_utf8_lossy(&output.stdout);
    for prefix in ["Training set accuracy:", "Test set accuracy:"] {
        let value = line_value(&stdout, prefix);
        assert_eq!(value.split('.').nth(1).map(str::len), Some(3), "{value}");
        let accuracy: f64 = value.parse().expect("Accuracy should be a number");
        assert!((0.0..=1.0).contains(&accuracy));
    }
    let average: f64 = line_value(&stdout, "Average Cross-Validation Score:")
        .parse()
        .expect("Average should be a number");
    assert!((0.0..=1.0).contains(&average));

    let scores = line_value(&stdout, "Cross-validation scores:");
    assert_eq!(scores.matches(',').count(), 9, "{scores}");

    assert!(line_value(&stdout, "Final Model:").contains("kernel='linear'"));
    assert!(stdout.contains("Confusion Matrix:"));
    assert!(!stdout.contains("Previous model test accuracy"));
}

#[test]
fn test_cli_second_run_reports_previous_model() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("svm_model.json");

    let first = run_pipeline(&test_data, &model_path, &[]);
    assert!(first.status.success());
    let second = run_pipeline(&test_data, &model_path, &[]);
    assert!(second.status.success());

    let first_stdout = String::from_utf8_lossy(&first.stdout);
    let second_stdout = String::from_utf8_lossy(&second.stdout);
    assert_eq!(
        line_value(&second_stdout, "Previous model test accuracy:"),
        line_value(&first_stdout, "Test set accuracy:")
    );
}

#[test]
fn test_cli_use_tuned() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("svm_model.json");

    let output = run_pipeline(&test_data, &model_path, &["--use-tuned", "--scale-cv"]);
    assert!(
        output.status.success(),
        "Pipeline failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let best = line_value(&stdout, "Best Model:");
    let final_model = line_value(&stdout, "Final Model:");
    assert!(best.starts_with(final_model), "{best} vs {final_model}");
}

#[test]
fn test_cli_info_command() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("svm_model.json");

    let train_output = run_pipeline(&test_data, &model_path, &[]);
    assert!(train_output.status.success());

    let output = Command::new(get_cli_binary_path())
        .args(["info", "--model", model_path.to_str().unwrap()])
        .output()
        .expect("Failed to run CLI info command");

    assert!(
        output.status.success(),
        "Info command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== SVM Model Summary ==="));
    assert!(stdout.contains("Pairwise Machines: 10"));
    assert!(stdout.contains("Classes: [1, 2, 3, 4, 5]"));
}

#[test]
fn test_cli_info_missing_model() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("absent.json");

    let output = Command::new(get_cli_binary_path())
        .args(["info", "--model", model_path.to_str().unwrap()])
        .output()
        .expect("Failed to run CLI info command");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("No saved model found"));
}

#[test]
fn test_cli_missing_data_file() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("svm_model.json");

    let output = Command::new(get_cli_binary_path())
        .args([
            "--data",
            temp_dir.path().join("missing.csv").to_str().unwrap(),
            "--model",
            model_path.to_str().unwrap(),
            "--config",
            test_data.config_file.path().to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run CLI");

    assert_eq!(output.status.code(), Some(1));
    assert!(!model_path.exists());
}

#[test]
fn test_cli_missing_column() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("svm_model.json");

    let output = Command::new(get_cli_binary_path())
        .args([
            "--data",
            test_data.bad_csv_file.path().to_str().unwrap(),
            "--model",
            model_path.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run CLI");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("BLK"));
    assert!(!model_path.exists());
}

#[test]
fn test_cli_invalid_config() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.json");
    std::fs::write(&config_path, "{ \"cv_folds\": \"ten\" }").unwrap();

    let output = Command::new(get_cli_binary_path())
        .args([
            "--data",
            test_data.csv_file.path().to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run CLI");

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_cli_help() {
    let output = Command::new(get_cli_binary_path())
        .arg("--help")
        .output()
        .expect("Failed to run CLI help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--data", "--model", "--config", "--use-tuned", "--scale-cv", "info"] {
        assert!(stdout.contains(flag), "help is missing {flag}");
    }
}
