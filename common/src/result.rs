use std::path::Path;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs::{create_dir_all, read_to_string, write};

use crate::{config::Configuration, error::PlotError};

/// A configuration and the throughput of each of its trials, in run order.
/// Serialized as a two element array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry(Configuration, Vec<f64>);

impl ResultEntry {
    pub fn new(config: Configuration, trials: Vec<f64>) -> Self {
        Self(config, trials)
    }

    pub fn config(&self) -> &Configuration {
        &self.0
    }

    pub fn trials(&self) -> &[f64] {
        &self.1
    }
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResultsFile {
    #[serde(rename = "RESULTS")]
    pub results: Vec<ResultEntry>,
}

#[derive(Serialize)]
struct ResultsFileRef<'a> {
    #[serde(rename = "RESULTS")]
    results: &'a [ResultEntry],
}

pub fn encode_results(results: &[ResultEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ResultsFileRef { results })?)
}

pub fn decode_results(data: &str) -> Result<Vec<ResultEntry>, PlotError> {
    let file: ResultsFile = serde_json::from_str(data)?;
    Ok(file.results)
}

/// Replaces the whole file with every entry collected so far.
pub async fn write_results(path: &Path, results: &[ResultEntry]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        create_dir_all(parent)
            .await
            .context(format!("Create results dir {}", parent.display()))?;
    }
    write(path, encode_results(results)?)
        .await
        .context(format!("Write results to {}", path.display()))
}

pub async fn read_results(path: &Path) -> Result<Vec<ResultEntry>> {
    let data = read_to_string(path)
        .await
        .context(format!("Read results from {}", path.display()))?;
    Ok(decode_results(&data).context(format!("Decode {}", path.display()))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AllocPolicy, PinPolicy};

    fn sample() -> Vec<ResultEntry> {
        vec![
            ResultEntry::new(
                Configuration::new(1, PinPolicy::None, AllocPolicy::Once),
                vec![100.0, 120.0, 110.0],
            ),
            ResultEntry::new(
                Configuration::new(8, PinPolicy::Cpu, AllocPolicy::Numa),
                vec![50.5, 55.25, 45.125],
            ),
        ]
    }

    #[tokio::test]
    async fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.json");
        write_results(&path, &sample()).await.unwrap();
        assert_eq!(read_results(&path).await.unwrap(), sample());

        // later checkpoints overwrite rather than append
        write_results(&path, &sample()[..1]).await.unwrap();
        assert_eq!(read_results(&path).await.unwrap(), sample()[..1].to_vec());
    }

    #[test]
    fn entries_are_pairs_under_fixed_name() {
        let encoded = encode_results(&sample()[..1]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "RESULTS": [[
                    {"num-cpus": 1, "pin-policy": "none", "alloc-policy": "once"},
                    [100.0, 120.0, 110.0]
                ]]
            })
        );
    }

    #[test]
    fn malformed_content_is_rejected() {
        assert!(decode_results("RESULTS = []").is_err());
        assert!(decode_results(r#"{"results": []}"#).is_err());
        let unknown_policy = r#"{"RESULTS": [[
            {"num-cpus": 1, "pin-policy": "none", "alloc-policy": "hugepage"},
            [1.0]
        ]]}"#;
        assert!(matches!(
            decode_results(unknown_policy),
            Err(PlotError::Decode(_))
        ));
        assert!(decode_results(r#"{"RESULTS": []}"#).unwrap().is_empty());
    }

    #[test]
    fn decode_error_chain_names_cause_once() {
        let err = decode_results(r#"{"RESULTS": [[
            {"num-cpus": 1, "pin-policy": "none", "alloc-policy": "once"},
            [null, 1.0]
        ]]}"#)
        .unwrap_err();
        let chain = format!("{:#}", eyre::Report::new(err));
        assert!(chain.starts_with("Could not decode results: "), "{chain}");
        assert_eq!(chain.matches("invalid type").count(), 1, "{chain}");
    }
}
