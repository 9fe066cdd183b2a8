use std::{collections::HashMap, sync::Mutex};

use common::{
    bench::TrialRunner,
    config::{AllocPolicy, Configuration, Grid, PinPolicy},
    error::SweepError,
    plot::aggregate,
    result::read_results,
    sweep::{NUM_TRIALS, run_sweep},
};
use indicatif::ProgressBar;

/// Stand-in benchmark returning a fixed sequence of values per cpu count
struct StubBench {
    outputs: Mutex<HashMap<u32, Vec<&'static str>>>,
}

#[async_trait::async_trait]
impl TrialRunner for StubBench {
    async fn run(&self, config: &Configuration) -> Result<f64, SweepError> {
        let output = self
            .outputs
            .lock()
            .unwrap()
            .get_mut(&config.num_cpus)
            .map(|values| values.remove(0))
            .unwrap_or("");
        common::bench::parse_output(output)
    }
}

#[tokio::test]
async fn sweep_then_plot() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("once.json");
    let grids = vec![Grid {
        num_cpus: vec![1, 8],
        pin_policies: vec![PinPolicy::None],
        alloc_policies: vec![AllocPolicy::Once],
    }];
    let bench = StubBench {
        outputs: Mutex::new(HashMap::from([
            (1, vec!["100.0\n", "120.0\n", "110.0\n"]),
            (8, vec!["50.0\n", "55.0\n", "45.0\n"]),
        ])),
    };

    run_sweep(&grids, &bench, NUM_TRIALS, &output, &ProgressBar::hidden())
        .await
        .unwrap();

    let entries = read_results(&output).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].config().num_cpus, 1);
    assert_eq!(entries[0].trials(), [100.0, 120.0, 110.0]);
    assert_eq!(entries[1].config().num_cpus, 8);
    assert_eq!(entries[1].trials(), [50.0, 55.0, 45.0]);

    let series = aggregate(&entries).unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].name, "once");
    assert_eq!(series[0].xs(), [1, 8]);
    assert_eq!(series[0].medians(), [110.0, 50.0]);
}

#[tokio::test]
async fn malformed_output_aborts_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("bad.json");
    let grids = vec![Grid {
        num_cpus: vec![1],
        pin_policies: vec![PinPolicy::Node],
        alloc_policies: vec![AllocPolicy::Numa],
    }];
    let bench = StubBench {
        outputs: Mutex::new(HashMap::from([(1, vec!["1.0", "ops 2.0"])])),
    };

    let err = run_sweep(&grids, &bench, NUM_TRIALS, &output, &ProgressBar::hidden())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SweepError>(),
        Some(SweepError::TokenCount { count: 2, .. })
    ));
    assert!(!output.exists());
}

#[tokio::test]
async fn non_finite_output_aborts_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("inf.json");
    let grids = vec![Grid {
        num_cpus: vec![1],
        pin_policies: vec![PinPolicy::None],
        alloc_policies: vec![AllocPolicy::Once],
    }];
    let bench = StubBench {
        outputs: Mutex::new(HashMap::from([(1, vec!["inf\n", "NaN\n", "1.0\n"])])),
    };

    let err = run_sweep(&grids, &bench, NUM_TRIALS, &output, &ProgressBar::hidden())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SweepError>(),
        Some(SweepError::NonFinite(_))
    ));
    assert!(!output.exists());
}
