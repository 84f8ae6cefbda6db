//! CSV reporting of phase results.

use std::{
    fs::{self, OpenOptions},
    io,
    path::Path,
};

use serde::Serialize;
use strum_macros::Display;

use super::{BenchConfig, Phase, PhaseResult};
use crate::{
    backend::ConstraintStats,
    curves::Curve,
    primitives::{Primitive, PrimitiveConfig, PrimitiveResult},
    utils::errors::PipelineError,
    utils::profiling::bytes_to_mb,
};

const FRAMEWORK: &str = "arkworks";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Circuit,
    Recursion,
}

/// Host description repeated on every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineInfo {
    pub physical_cores: usize,
    pub logical_cores: usize,
    pub cpu: String,
}

/// The inner half of a recursion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnerSummary {
    pub curve: Curve,
    pub constraints: usize,
    pub prove_time_ms: u64,
}

impl InnerSummary {
    pub fn new(curve: Curve, stats: ConstraintStats, phases: &[PhaseResult]) -> Self {
        let prove_time_ms = phases
            .iter()
            .find(|p| p.phase == Phase::Prove)
            .map_or(0, |p| p.elapsed.as_millis() as u64);
        Self {
            curve,
            constraints: stats.constraints,
            prove_time_ms,
        }
    }
}

/// One CSV row. Column names follow the shared benchmark layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchRecord {
    pub framework: String,
    pub category: String,
    pub backend: String,
    pub curve: String,
    pub circuit: String,
    pub input: String,
    pub operation: String,
    pub nb_constraints: usize,
    pub nb_secret: usize,
    pub nb_public: usize,
    pub proof_size: usize,
    #[serde(rename = "ram(mb)")]
    pub ram_mb: u64,
    pub count: usize,
    #[serde(rename = "time(ms)")]
    pub time_ms: u64,
    pub nb_physical_cores: usize,
    pub nb_logical_cores: usize,
    pub cpu: String,
    pub inner_curve: Option<String>,
    pub inner_nb_constraints: Option<usize>,
    #[serde(rename = "innerProveTime(ms)")]
    pub inner_prove_time_ms: Option<u64>,
}

impl BenchRecord {
    pub fn new(
        config: &BenchConfig,
        category: Category,
        stats: ConstraintStats,
        result: &PhaseResult,
        machine: &MachineInfo,
        inner: Option<InnerSummary>,
    ) -> Self {
        // Only proving and verification produce or consume a proof.
        let proof_size = match result.phase {
            Phase::Prove | Phase::Verify => result.artifact_bytes,
            _ => 0,
        };
        Self {
            framework: FRAMEWORK.to_string(),
            category: category.to_string(),
            backend: config.backend.to_string(),
            curve: config.curve.to_string(),
            circuit: config.circuit.to_string(),
            input: config.input_label(),
            operation: result.phase.to_string(),
            nb_constraints: stats.constraints,
            nb_secret: stats.secret,
            nb_public: stats.public,
            proof_size,
            ram_mb: bytes_to_mb(result.peak_memory),
            count: result.iterations,
            time_ms: result.elapsed.as_millis() as u64,
            nb_physical_cores: machine.physical_cores,
            nb_logical_cores: machine.logical_cores,
            cpu: machine.cpu.clone(),
            inner_curve: inner.map(|i| i.curve.to_string()),
            inner_nb_constraints: inner.map(|i| i.constraints),
            inner_prove_time_ms: inner.map(|i| i.prove_time_ms),
        }
    }
}

/// One row of a native field or curve operation timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveRecord {
    pub framework: String,
    pub category: String,
    pub curve: String,
    pub domain: String,
    pub operation: String,
    pub input: String,
    #[serde(rename = "ram(mb)")]
    pub ram_mb: u64,
    pub count: usize,
    #[serde(rename = "time(ns)")]
    pub time_ns: u64,
    pub nb_physical_cores: usize,
    pub nb_logical_cores: usize,
    pub cpu: String,
}

impl PrimitiveRecord {
    pub fn new(
        config: &PrimitiveConfig,
        primitive: Primitive,
        result: &PrimitiveResult,
        machine: &MachineInfo,
    ) -> Self {
        Self {
            framework: FRAMEWORK.to_string(),
            category: primitive.category().to_string(),
            curve: config.curve.to_string(),
            domain: primitive.domain(),
            operation: primitive.operation(),
            input: config.input_label(),
            ram_mb: bytes_to_mb(result.peak_memory),
            count: result.count,
            time_ns: u64::try_from(result.mean.as_nanos()).unwrap_or(u64::MAX),
            nb_physical_cores: machine.physical_cores,
            nb_logical_cores: machine.logical_cores,
            cpu: machine.cpu.clone(),
        }
    }
}

/// Appends records to a CSV file, writing the header only when the file is
/// new or empty. Without a path, records are only logged.
pub struct CsvReporter {
    machine: MachineInfo,
    writer: Option<csv::Writer<fs::File>>,
}

impl CsvReporter {
    pub fn new(machine: MachineInfo, output: Option<&Path>) -> Result<Self, PipelineError> {
        let writer = output.map(open_appending).transpose()?;
        Ok(Self { machine, writer })
    }

    fn write(&mut self, record: &BenchRecord) -> Result<(), PipelineError> {
        tracing::info!(
            circuit = %record.circuit,
            curve = %record.curve,
            operation = %record.operation,
            constraints = record.nb_constraints,
            time_ms = record.time_ms,
            ram_mb = record.ram_mb,
            "benchmark result"
        );
        self.append(record)
    }

    pub fn record_primitive(
        &mut self,
        config: &PrimitiveConfig,
        primitive: Primitive,
        result: &PrimitiveResult,
    ) -> Result<(), PipelineError> {
        let record = PrimitiveRecord::new(config, primitive, result, &self.machine);
        tracing::info!(
            curve = %record.curve,
            domain = %record.domain,
            operation = %record.operation,
            time_ns = record.time_ns,
            "primitive result"
        );
        self.append(&record)
    }

    fn append<R: Serialize>(&mut self, record: &R) -> Result<(), PipelineError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.serialize(record)?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Writes one row per executed phase of a run.
    pub fn record_run(
        &mut self,
        config: &BenchConfig,
        category: Category,
        stats: ConstraintStats,
        phases: &[PhaseResult],
        inner: Option<InnerSummary>,
    ) -> Result<(), PipelineError> {
        for result in phases {
            let record =
                BenchRecord::new(config, category, stats, result, &self.machine, inner);
            self.write(&record)?;
        }
        Ok(())
    }
}

fn open_appending(path: &Path) -> Result<csv::Writer<fs::File>, PipelineError> {
    let has_content = match fs::metadata(path) {
        Ok(meta) => meta.len() > 0,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => return Err(e.into()),
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(csv::WriterBuilder::new()
        .has_headers(!has_content)
        .from_writer(file))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{backend::Backend, circuits::CircuitKind};

    fn config() -> BenchConfig {
        BenchConfig {
            backend: Backend::Groth16,
            curve: Curve::Bn254,
            circuit: CircuitKind::Expo,
            size: 3,
            count: 2,
            phase: Phase::Prove,
            input: None,
            seed: None,
        }
    }

    fn result(phase: Phase) -> PhaseResult {
        PhaseResult {
            phase,
            elapsed: Duration::from_millis(12),
            peak_memory: 64 << 20,
            artifact_bytes: 128,
            iterations: 2,
        }
    }

    fn machine() -> MachineInfo {
        MachineInfo {
            physical_cores: 4,
            logical_cores: 8,
            cpu: "test-cpu".to_string(),
        }
    }

    #[test]
    fn record_fills_columns() {
        let stats = ConstraintStats {
            constraints: 4,
            public: 1,
            secret: 4,
        };
        let record = BenchRecord::new(
            &config(),
            Category::Circuit,
            stats,
            &result(Phase::Prove),
            &machine(),
            None,
        );
        assert_eq!(record.operation, "prove");
        assert_eq!(record.curve, "bn254");
        assert_eq!(record.input, "none");
        assert_eq!(record.proof_size, 128);
        assert_eq!(record.ram_mb, 64);
        assert_eq!(record.time_ms, 12);
        assert_eq!(record.inner_curve, None);

        let setup = BenchRecord::new(
            &config(),
            Category::Circuit,
            stats,
            &result(Phase::Setup),
            &machine(),
            None,
        );
        assert_eq!(setup.proof_size, 0);
    }

    #[test]
    fn header_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        for _ in 0..2 {
            let mut reporter = CsvReporter::new(machine(), Some(path.as_path())).unwrap();
            reporter
                .record_run(
                    &config(),
                    Category::Recursion,
                    ConstraintStats::default(),
                    &[result(Phase::Compile)],
                    Some(InnerSummary::new(
                        Curve::Bls12_377,
                        ConstraintStats {
                            constraints: 9,
                            ..Default::default()
                        },
                        &[result(Phase::Prove)],
                    )),
                )
                .unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("framework,category,backend,curve,circuit,input,operation,nbConstraints"));
        assert!(lines[0].contains("ram(mb)"));
        assert!(lines[0].ends_with("innerCurve,innerNbConstraints,innerProveTime(ms)"));
        assert!(lines[1].ends_with("bls12-377,9,12"));
        assert_eq!(lines[1], lines[2]);
    }
}
