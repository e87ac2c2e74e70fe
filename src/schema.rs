//! Serde model of one benchmark result file.
//!
//! Every field is optional: result files come from several runner versions and
//! two zkVM back-ends, and a missing section is an ordinary, expected state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// One benchmark run as written by the workload runner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkRecord {
    pub name: Option<String>,
    pub timestamp_completed: Option<serde_json::Value>,
    /// Auxiliary numeric fields (gas used, block number, ...).
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub execution: Option<Phase<ExecutionSuccess>>,
    /// Older runners wrote this section under `prove`.
    #[serde(alias = "prove")]
    pub proving: Option<Phase<ProvingSuccess>>,
}

impl BenchmarkRecord {
    pub fn execution_success(&self) -> Option<&ExecutionSuccess> {
        self.execution.as_ref().and_then(|p| p.success.as_ref())
    }

    pub fn proving_success(&self) -> Option<&ProvingSuccess> {
        self.proving.as_ref().and_then(|p| p.success.as_ref())
    }
}

/// Outcome of one measurement phase: either `success` or `crashed` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase<T> {
    #[serde(default)]
    pub success: Option<T>,
    #[serde(default)]
    pub crashed: Option<CrashInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrashInfo {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSuccess {
    pub total_num_cycles: Option<u64>,
    pub region_cycles: BTreeMap<String, u64>,
    pub execution_duration: Option<DurationRepr>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvingSuccess {
    pub proving_time_ms: Option<f64>,
    pub prove_duration: Option<DurationRepr>,
    pub proof_size: Option<u64>,
    #[serde(alias = "peak_memory_bytes")]
    pub peak_memory_usage_bytes: Option<u64>,
    pub average_memory_usage_bytes: Option<u64>,
    pub initial_memory_usage_bytes: Option<u64>,
    pub cycles_used: Option<u64>,
}

/// `std::time::Duration` as serde writes it: `{"secs": .., "nanos": ..}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationRepr {
    pub secs: u64,
    pub nanos: u32,
}

impl DurationRepr {
    pub fn as_duration(&self) -> Duration {
        Duration::new(self.secs, 0).saturating_add(Duration::from_nanos(u64::from(self.nanos)))
    }

    pub fn as_millis_f64(&self) -> f64 {
        self.secs as f64 * 1_000.0 + f64::from(self.nanos) / 1_000_000.0
    }
}

/// Contents of the optional `hardware.json` next to a result folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub cpu_model: String,
    pub total_ram_gib: u64,
    #[serde(default)]
    pub gpus: Vec<GpuInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuInfo {
    pub model: String,
}

impl HardwareInfo {
    /// One-line description, e.g. `AMD EPYC 9454, 512 GiB RAM, GPUs: RTX 4090 x2`.
    pub fn describe(&self) -> String {
        let mut line = format!("{}, {} GiB RAM", self.cpu_model, self.total_ram_gib);
        if self.gpus.is_empty() {
            return line;
        }

        let mut models: Vec<(&str, usize)> = Vec::new();
        for gpu in &self.gpus {
            match models.iter_mut().find(|(m, _)| *m == gpu.model) {
                Some((_, n)) => *n += 1,
                None => models.push((gpu.model.as_str(), 1)),
            }
        }
        let gpus: Vec<String> = models
            .into_iter()
            .map(|(m, n)| if n > 1 { format!("{m} x{n}") } else { m.to_string() })
            .collect();
        line.push_str(", GPUs: ");
        line.push_str(&gpus.join(", "));
        line
    }
}

/// Raw payload shape: one record or an array of records.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Payload {
    Many(Vec<BenchmarkRecord>),
    One(Box<BenchmarkRecord>),
}

impl Payload {
    pub(crate) fn into_records(self) -> Vec<BenchmarkRecord> {
        match self {
            Payload::Many(v) => v,
            Payload::One(r) => vec![*r],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_record() {
        let json = r#"{
            "name": "t1",
            "timestamp_completed": "2025-01-01T00:00:00Z",
            "metadata": {"gas_used": 1000000, "block": "x"},
            "execution": {"success": {
                "total_num_cycles": 12345,
                "region_cycles": {"validation": 100, "setup": 5},
                "execution_duration": {"secs": 1, "nanos": 500000000}
            }},
            "proving": {"success": {
                "proving_time_ms": 2500,
                "proof_size": 2048,
                "peak_memory_usage_bytes": 1073741824
            }}
        }"#;
        let rec: BenchmarkRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.name.as_deref(), Some("t1"));
        assert_eq!(rec.metadata["gas_used"], serde_json::json!(1000000));

        let exec = rec.execution_success().unwrap();
        assert_eq!(exec.total_num_cycles, Some(12345));
        assert_eq!(exec.region_cycles["validation"], 100);
        assert_eq!(exec.execution_duration.unwrap().as_millis_f64(), 1500.0);

        let prov = rec.proving_success().unwrap();
        assert_eq!(prov.proving_time_ms, Some(2500.0));
        assert_eq!(prov.proof_size, Some(2048));
    }

    #[test]
    fn accepts_prove_key_and_crashed_sections() {
        let json = r#"{
            "execution": {"crashed": {"reason": "panic"}},
            "prove": {"success": {"prove_duration": {"secs": 3, "nanos": 0}, "peak_memory_bytes": 7}}
        }"#;
        let rec: BenchmarkRecord = serde_json::from_str(json).unwrap();
        assert!(rec.execution_success().is_none());
        assert_eq!(
            rec.execution.as_ref().unwrap().crashed.as_ref().unwrap().reason,
            "panic"
        );

        let prov = rec.proving_success().unwrap();
        assert_eq!(prov.prove_duration.unwrap().as_duration().as_secs(), 3);
        assert_eq!(prov.peak_memory_usage_bytes, Some(7));
    }

    #[test]
    fn payload_shapes_normalize_to_sequence() {
        let one: Payload = serde_json::from_str(r#"{"name": "a"}"#).unwrap();
        assert_eq!(one.into_records().len(), 1);

        let many: Payload = serde_json::from_str(r#"[{"name": "a"}, {}]"#).unwrap();
        let recs = many.into_records();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1].name, None);
    }

    #[test]
    fn hardware_description_groups_gpus() {
        let hw = HardwareInfo {
            cpu_model: "AMD EPYC".into(),
            total_ram_gib: 512,
            gpus: vec![
                GpuInfo { model: "RTX 4090".into() },
                GpuInfo { model: "RTX 4090".into() },
                GpuInfo { model: "A100".into() },
            ],
        };
        assert_eq!(
            hw.describe(),
            "AMD EPYC, 512 GiB RAM, GPUs: RTX 4090 x2, A100"
        );
    }
}
