use std::fmt;

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::error::SweepError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PinPolicy {
    #[default]
    None,
    Node,
    Cpu,
}

impl PinPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PinPolicy::None => "none",
            PinPolicy::Node => "node",
            PinPolicy::Cpu => "cpu",
        }
    }
}

impl fmt::Display for PinPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocPolicy {
    #[default]
    Once,
    PerThread,
    Numa,
}

impl AllocPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocPolicy::Once => "once",
            AllocPolicy::PerThread => "per-thread",
            AllocPolicy::Numa => "numa",
        }
    }
}

impl fmt::Display for AllocPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete point of a sweep, passed to the benchmark as flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Configuration {
    pub num_cpus: u32,
    pub pin_policy: PinPolicy,
    pub alloc_policy: AllocPolicy,
}

impl Configuration {
    pub fn new(num_cpus: u32, pin_policy: PinPolicy, alloc_policy: AllocPolicy) -> Self {
        Self {
            num_cpus,
            pin_policy,
            alloc_policy,
        }
    }

    /// Command line flags for the benchmark binary
    pub fn args(&self) -> Vec<String> {
        vec!["--num-cpus", "--pin-policy", "--alloc-policy"]
            .into_iter()
            .zip([
                self.num_cpus.to_string(),
                self.pin_policy.to_string(),
                self.alloc_policy.to_string(),
            ])
            .flat_map(|(flag, value)| [flag.to_owned(), value])
            .collect()
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "num-cpus={} pin-policy={} alloc-policy={}",
            self.num_cpus, self.pin_policy, self.alloc_policy
        )
    }
}

/// Allowed values for each sweep dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub num_cpus: Vec<u32>,
    pub pin_policies: Vec<PinPolicy>,
    pub alloc_policies: Vec<AllocPolicy>,
}

impl Grid {
    /// Cartesian product with `num_cpus` outermost and `alloc_policies` innermost.
    pub fn configurations(&self) -> Vec<Configuration> {
        iproduct!(
            self.num_cpus.iter(),
            self.pin_policies.iter(),
            self.alloc_policies.iter()
        )
        .map(|(cpus, pin, alloc)| Configuration::new(*cpus, *pin, *alloc))
        .collect()
    }

    pub fn len(&self) -> usize {
        self.num_cpus.len() * self.pin_policies.len() * self.alloc_policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pinning is only meaningful for numa allocation, every other
    /// allocation policy must run unpinned.
    pub fn validate(&self) -> Result<(), SweepError> {
        if self.num_cpus.contains(&0) {
            return Err(SweepError::InvalidGrid("num-cpus must be positive".to_owned()));
        }
        let pinned = self.pin_policies.iter().any(|p| *p != PinPolicy::None);
        if let Some(alloc) = self
            .alloc_policies
            .iter()
            .find(|a| **a != AllocPolicy::Numa)
            && pinned
        {
            return Err(SweepError::InvalidGrid(format!(
                "pin policies {:?} cannot be combined with alloc policy {alloc}",
                self.pin_policies
            )));
        }
        Ok(())
    }
}

/// `1` followed by every multiple of `step` up to and including `max`
pub fn cpu_counts(max: u32, step: u32) -> Result<Vec<u32>, SweepError> {
    if step == 0 || max == 0 {
        return Err(SweepError::InvalidGrid(format!(
            "cpu step ({step}) and max cpus ({max}) must be positive"
        )));
    }
    Ok(std::iter::once(1)
        .chain((step..=max).step_by(step as usize).filter(|n| *n != 1))
        .collect())
}

/// Grids benchmarked by the runner: shared slab, per-thread malloc, then
/// numa-local allocation under both pinning policies.
pub fn default_grids(cpus: &[u32]) -> Vec<Grid> {
    vec![
        Grid {
            num_cpus: cpus.to_vec(),
            pin_policies: vec![PinPolicy::None],
            alloc_policies: vec![AllocPolicy::Once],
        },
        Grid {
            num_cpus: cpus.to_vec(),
            pin_policies: vec![PinPolicy::None],
            alloc_policies: vec![AllocPolicy::PerThread],
        },
        Grid {
            num_cpus: cpus.to_vec(),
            pin_policies: vec![PinPolicy::Node, PinPolicy::Cpu],
            alloc_policies: vec![AllocPolicy::Numa],
        },
    ]
}
