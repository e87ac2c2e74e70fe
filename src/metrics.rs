//! Scalar metrics pulled out of a [`BenchmarkRecord`].
//!
//! Absent sections and absent fields stay `None` all the way through; a
//! derived value (seconds, KiB, GiB, ns) exists only when its source does.

use crate::names::{extract_op_count, OpCount};
use crate::schema::{BenchmarkRecord, ExecutionSuccess, ProvingSuccess};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

const KIB: f64 = 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Everything extractable from one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMetrics {
    pub execution: Option<ExecutionMetrics>,
    pub proving: Option<ProvingMetrics>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionMetrics {
    pub total_num_cycles: Option<u64>,
    pub duration: Option<Duration>,
    pub region_cycles: BTreeMap<String, u64>,
}

impl ExecutionMetrics {
    pub fn duration_ms(&self) -> Option<f64> {
        self.duration.map(|d| d.as_secs_f64() * 1_000.0)
    }

    pub fn duration_ns(&self) -> Option<f64> {
        self.duration.map(|d| d.as_nanos() as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvingMetrics {
    pub proving_time_ms: Option<f64>,
    pub proof_size: Option<u64>,
    pub peak_memory_bytes: Option<u64>,
    pub average_memory_bytes: Option<u64>,
    pub initial_memory_bytes: Option<u64>,
    pub cycles_used: Option<u64>,
}

impl ProvingMetrics {
    pub fn proving_time_s(&self) -> Option<f64> {
        self.proving_time_ms.map(|ms| ms / 1_000.0)
    }

    pub fn proving_time_ns(&self) -> Option<f64> {
        self.proving_time_ms.map(|ms| ms * 1e6)
    }

    pub fn proof_size_kb(&self) -> Option<f64> {
        self.proof_size.map(|b| b as f64 / KIB)
    }

    pub fn peak_memory_gb(&self) -> Option<f64> {
        self.peak_memory_bytes.map(|b| b as f64 / GIB)
    }
}

/// The three proving metrics a two-system comparison needs, all present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProvingSummary {
    pub proving_time_ms: f64,
    pub proof_size_bytes: f64,
    pub peak_memory_bytes: f64,
}

impl ProvingSummary {
    pub fn proving_time_s(&self) -> f64 {
        self.proving_time_ms / 1_000.0
    }

    pub fn proof_size_kb(&self) -> f64 {
        self.proof_size_bytes / KIB
    }

    pub fn peak_memory_gb(&self) -> f64 {
        self.peak_memory_bytes / GIB
    }
}

pub fn extract(record: &BenchmarkRecord) -> RecordMetrics {
    RecordMetrics {
        execution: record.execution_success().map(execution_metrics),
        proving: record.proving_success().map(proving_metrics),
    }
}

fn execution_metrics(success: &ExecutionSuccess) -> ExecutionMetrics {
    ExecutionMetrics {
        total_num_cycles: success.total_num_cycles,
        duration: success.execution_duration.map(|d| d.as_duration()),
        region_cycles: success.region_cycles.clone(),
    }
}

fn proving_metrics(success: &ProvingSuccess) -> ProvingMetrics {
    ProvingMetrics {
        proving_time_ms: proving_time_ms(success),
        proof_size: success.proof_size,
        peak_memory_bytes: success.peak_memory_usage_bytes,
        average_memory_bytes: success.average_memory_usage_bytes,
        initial_memory_bytes: success.initial_memory_usage_bytes,
        cycles_used: success.cycles_used,
    }
}

/// `prove_duration` wins over `proving_time_ms` when a runner wrote both.
fn proving_time_ms(success: &ProvingSuccess) -> Option<f64> {
    success
        .prove_duration
        .map(|d| d.as_millis_f64())
        .or(success.proving_time_ms)
}

/// `None` unless proving time, proof size and peak memory are all recorded.
pub fn extract_proving(record: &BenchmarkRecord) -> Option<ProvingSummary> {
    let success = record.proving_success()?;
    Some(ProvingSummary {
        proving_time_ms: proving_time_ms(success)?,
        proof_size_bytes: success.proof_size? as f64,
        peak_memory_bytes: success.peak_memory_usage_bytes? as f64,
    })
}

/// One opcode measurement: a row of the samples CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub opcode: String,
    pub op_count: u64,
    pub sample_id: u32,
    pub total_num_cycles: Option<u64>,
    pub execution_time_ns: Option<f64>,
    pub prove_time_ns: Option<f64>,
    pub peak_memory_bytes: Option<u64>,
}

/// Builds a sample from a record named `name`; `None` if the name carries no
/// opcode count or the record has neither an execution nor a proving result.
pub fn extract_sample(name: &str, record: &BenchmarkRecord, sample_id: u32) -> Option<Sample> {
    let OpCount { opcode, op_count } = extract_op_count(name)?;
    let metrics = extract(record);
    if metrics.execution.is_none() && metrics.proving.is_none() {
        return None;
    }

    let execution = metrics.execution.as_ref();
    let proving = metrics.proving.as_ref();
    Some(Sample {
        opcode,
        op_count,
        sample_id,
        total_num_cycles: execution
            .and_then(|e| e.total_num_cycles)
            .or_else(|| proving.and_then(|p| p.cycles_used)),
        execution_time_ns: execution.and_then(ExecutionMetrics::duration_ns),
        prove_time_ns: proving.and_then(ProvingMetrics::proving_time_ns),
        peak_memory_bytes: proving.and_then(|p| p.peak_memory_bytes),
    })
}
