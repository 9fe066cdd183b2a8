use eyre::Result;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Spread of the trials observed for one configuration
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TrialStats {
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

impl TrialStats {
    /// `None` when there are no trials. The median is the element at
    /// `len / 2` of the sorted trials, no interpolation for even counts.
    pub fn from_trials(trials: &[f64]) -> Option<Self> {
        if trials.is_empty() {
            return None;
        }
        let mut sorted = trials.to_vec();
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            min: sorted[0],
            median: sorted[sorted.len() / 2],
            max: sorted[sorted.len() - 1],
        })
    }

    /// Asymmetric error bar extents, below and above the median
    pub fn error(&self) -> (f64, f64) {
        (self.median - self.min, self.max - self.median)
    }
}

/// Installs the stderr subscriber used by both binaries.
///
/// Every crate in `targets` logs at the `RUST_LOG` level (info when unset)
/// unless one of the `--log` directives already names it.
pub fn init_tracing(targets: &[&str], directives: &[String]) -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("info".to_owned());
    let mut env_filter = EnvFilter::new("warn");

    for directive in directives {
        env_filter = env_filter.add_directive(directive.parse()?);
    }

    for target in targets {
        if !directives.iter().any(|x| x.starts_with(target)) {
            env_filter = env_filter.add_directive(format!("{target}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_count_median() {
        let stats = TrialStats::from_trials(&[10.0, 30.0, 20.0]).unwrap();
        assert_eq!(stats.median, 20.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.error(), (10.0, 10.0));
    }

    #[test]
    fn even_count_takes_upper_of_middle_pair() {
        let stats = TrialStats::from_trials(&[4.0, 2.0, 1.0, 3.0]).unwrap();
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.error(), (2.0, 1.0));
    }

    #[test]
    fn single_and_empty() {
        let stats = TrialStats::from_trials(&[7.5]).unwrap();
        assert_eq!(stats.error(), (0.0, 0.0));
        assert!(TrialStats::from_trials(&[]).is_none());
    }
}
