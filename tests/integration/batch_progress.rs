use std::cell::Cell;
use std::fs;

use ffbatch::engine::{BatchRunner, ConvertError, ErrorMode};
use proptest::prelude::*;
use tempfile::TempDir;

use crate::common::{approx, make_inputs};

fn runner(dir: &TempDir, names: &[&str], steps: usize) -> BatchRunner {
    let inputs = make_inputs(dir.path(), names);
    BatchRunner::new(inputs, Some(dir.path().join("out")), steps, true).out_suffix("out")
}

#[test]
fn test_three_files_two_steps() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir, &["a.wav", "b.wav", "c.wav"], 2);

    let mut values = Vec::new();
    let report = runner
        .run(
            |_, progress| {
                for _ in 0..2 {
                    progress.set(50.0);
                    progress.set(100.0);
                    progress.complete_step();
                }
                Ok(())
            },
            |v| values.push(v),
        )
        .unwrap();

    // set(50) and set(100) per step; completing a step repeats 100% of it
    assert_eq!(values.len(), 12);
    let share = 100.0 / 3.0;
    for file in 0..3 {
        let base = share * file as f64;
        let expected = [0.25, 0.5, 0.75, 1.0].map(|f| base + share * f);
        let got: Vec<f64> = values
            .iter()
            .copied()
            .filter(|v| *v > base + 1e-9 && *v <= base + share + 1e-9)
            .collect();
        assert_eq!(got.len(), 4, "file {file}: {values:?}");
        for (g, e) in got.iter().zip(expected) {
            assert!(approx(*g, e), "file {file}: got {g}, expected {e}");
        }
    }
    assert_eq!(*values.last().unwrap(), 100.0);
    assert_eq!(report.progress, Some(100.0));
    assert_eq!(report.succeeded(), 3);
}

#[test]
fn test_worker_without_progress_still_completes() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir, &["a.wav", "b.wav"], 3);
    let mut values = Vec::new();
    runner.run(|_, _| Ok(()), |v| values.push(v)).unwrap();
    assert_eq!(values.len(), 2);
    assert!(approx(values[0], 50.0));
    assert_eq!(values[1], 100.0);
}

#[test]
fn test_existing_output_fails_fast() {
    let dir = TempDir::new().unwrap();
    let inputs = make_inputs(dir.path(), &["a.wav", "b.wav"]);
    fs::write(dir.path().join("a.mp3"), b"old").unwrap();

    let runner = BatchRunner::new(inputs, None, 1, false).out_suffix("mp3");
    let calls = Cell::new(0);
    let err = runner
        .run(
            |_, _| {
                calls.set(calls.get() + 1);
                Ok(())
            },
            |_| {},
        )
        .unwrap_err();

    assert!(matches!(err, ConvertError::OutputExists { .. }));
    assert!(err.to_string().contains("--overwrite"));
    assert_eq!(calls.get(), 0);
    assert_eq!(fs::read(dir.path().join("a.mp3")).unwrap(), b"old");
}

#[test]
fn test_output_directory_is_created() {
    let dir = TempDir::new().unwrap();
    let inputs = make_inputs(dir.path(), &["a.wav"]);
    let out_dir = dir.path().join("nested").join("deeper");
    let runner = BatchRunner::new(inputs, Some(out_dir.clone()), 1, false).out_suffix("flac");
    runner
        .run(
            |ctx, _| {
                assert!(ctx.output.parent().unwrap().is_dir());
                fs::write(&ctx.output, b"flac").map_err(|source| ConvertError::Io {
                    path: ctx.output.clone(),
                    source,
                })
            },
            |_| {},
        )
        .unwrap();
    assert!(out_dir.join("a.flac").exists());
}

#[test]
fn test_continue_mode_reports_failures() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir, &["a.wav", "b.wav", "c.wav"], 1).error_mode(ErrorMode::Continue);

    let mut visited = Vec::new();
    let mut values = Vec::new();
    let err = runner
        .run(
            |ctx, progress| {
                visited.push(ctx.index);
                progress.set(50.0);
                if ctx.index == 1 {
                    return Err(ConvertError::InvalidOption {
                        option: "test".to_string(),
                        reason: "broken file".to_string(),
                    });
                }
                Ok(())
            },
            |v| values.push(v),
        )
        .unwrap_err();

    assert!(matches!(
        err,
        ConvertError::BatchFailed {
            failed: 1,
            total: 3
        }
    ));
    assert_eq!(visited, [0, 1, 2]);
    let max = values.iter().copied().fold(0.0, f64::max);
    assert!(max < 100.0);
    assert!(values.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_fail_fast_stops_at_first_error() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir, &["a.wav", "b.wav"], 1);
    let calls = Cell::new(0);
    let err = runner
        .run(
            |_, _| {
                calls.set(calls.get() + 1);
                Err(ConvertError::Cancelled)
            },
            |_| {},
        )
        .unwrap_err();
    assert!(matches!(err, ConvertError::Cancelled));
    assert_eq!(calls.get(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_progress_is_monotonic_and_bounded(
        files in 1usize..5,
        steps in 1usize..4,
        raw in prop::collection::vec(-50.0f64..150.0, 1..8),
        fails in prop::collection::vec(any::<bool>(), 5),
    ) {
        let dir = TempDir::new().unwrap();
        let names: Vec<String> = (0..files).map(|i| format!("f{i}.wav")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let runner = runner(&dir, &names, steps).error_mode(ErrorMode::Continue);

        let mut values = Vec::new();
        let result = runner.run(
            |ctx, progress| {
                for step in 0..steps {
                    for v in &raw {
                        progress.set(*v);
                    }
                    if fails[ctx.index] && step + 1 == steps {
                        return Err(ConvertError::Cancelled);
                    }
                    progress.complete_step();
                }
                Ok(())
            },
            |v| values.push(v),
        );

        let any_failed = fails[..files].iter().any(|f| *f);
        prop_assert_eq!(result.is_err(), any_failed);
        prop_assert!(values.windows(2).all(|w| w[0] <= w[1]));
        prop_assert!(values.iter().all(|v| (0.0..=100.0).contains(v)));
        let reached_end = values.last().is_some_and(|v| *v == 100.0);
        prop_assert_eq!(reached_end, !any_failed);
    }
}
