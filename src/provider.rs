use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::rank::{RankError, RankedList, RankingSettings, Recommendations};
use crate::record::{CategoryFilter, Dataset, Record};
use crate::scene::{Scene, SceneConfig, compose_scene};

/// Supplies one read-only snapshot of records per request.
pub trait DataProvider {
    fn describe(&self) -> String;

    fn snapshot(&self) -> Result<Dataset>;
}

/// Receives a finished scene.
pub trait RenderSink {
    fn render(&mut self, scene: Scene);
}

/// Receives the side-panel rankings.
pub trait SummarySink {
    fn summarize(&mut self, recommendations: Recommendations);
}

#[derive(Clone, Debug)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataProvider for JsonFileProvider {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn snapshot(&self) -> Result<Dataset> {
        load_dataset(&self.path)
    }
}

/// The four-row demo snapshot used when no dataset file is given.
#[derive(Clone, Copy, Debug, Default)]
pub struct SampleProvider;

impl DataProvider for SampleProvider {
    fn describe(&self) -> String {
        "built-in sample".to_owned()
    }

    fn snapshot(&self) -> Result<Dataset> {
        build_dataset(vec![
            Record::new("Emisor1", "Nemo1", 10.0, 0.5, "Sector1"),
            Record::new("Emisor2", "Nemo2", 20.0, 0.8, "Sector2"),
            Record::new("Emisor3", "Nemo3", 15.0, 1.2, "Sector1"),
            Record::new("Emisor4", "Nemo4", 25.0, 0.9, "Sector2"),
        ])
    }
}

pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    let dataset = parse_dataset(&raw)
        .with_context(|| format!("failed to parse dataset {}", path.display()))?;
    info!(path = %path.display(), records = dataset.len(), "loaded dataset snapshot");
    Ok(dataset)
}

/// Accepts either a bare array of rows or an object with a `records` array.
pub fn parse_dataset(raw: &str) -> Result<Dataset> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in dataset")?;
    let rows = match parsed {
        Value::Array(rows) => rows,
        Value::Object(mut object) => match object.remove("records") {
            Some(Value::Array(rows)) => rows,
            Some(_) => bail!("`records` must be an array"),
            None => bail!("dataset object has no `records` array"),
        },
        _ => bail!("dataset must be a JSON array or an object with `records`"),
    };

    let mut records = Vec::with_capacity(rows.len());
    for (row, value) in rows.into_iter().enumerate() {
        let record = Record::deserialize(value).with_context(|| format!("invalid record at row {row}"))?;
        records.push(record);
    }

    build_dataset(records)
}

/// Checks load-time invariants and wraps the rows into a snapshot.
pub fn build_dataset(records: Vec<Record>) -> Result<Dataset> {
    let mut codes = HashSet::with_capacity(records.len());
    for (row, record) in records.iter().enumerate() {
        if !record.duration.is_finite() || record.duration < 0.0 {
            return Err(anyhow!(
                "record {} at row {row} has invalid duration {}",
                record.code,
                record.duration
            ));
        }
        if !record.base_spread.is_finite() {
            return Err(anyhow!(
                "record {} at row {row} has non-finite base spread",
                record.code
            ));
        }
        if !codes.insert(record.code.as_str()) {
            return Err(anyhow!("duplicate code {} at row {row}", record.code));
        }
    }

    Ok(Dataset::from_validated(records))
}

/// One "selection changed" request: rank the whole snapshot, compose the
/// filtered scene, and hand both to their sinks.
pub fn run_request(
    dataset: &Dataset,
    filter: &CategoryFilter,
    ranking: &RankingSettings,
    scene_config: &SceneConfig,
    render: &mut impl RenderSink,
    summary: &mut impl SummarySink,
) -> Result<(), RankError> {
    let recommendations = Recommendations::build(dataset, ranking)?;
    summary.summarize(recommendations);
    render.render(compose_scene(dataset, filter, scene_config));
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct SummaryRow {
    pub category: String,
    pub issuer: String,
    pub code: String,
    pub duration: f64,
    pub base_spread: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SummaryList {
    pub title: String,
    pub rows: Vec<SummaryRow>,
    pub excluded: usize,
}

impl From<&RankedList> for SummaryList {
    fn from(list: &RankedList) -> Self {
        Self {
            title: list.title(),
            rows: list
                .entries
                .iter()
                .map(|entry| SummaryRow {
                    category: entry.record.category.clone(),
                    issuer: entry.record.issuer.clone(),
                    code: entry.record.code.clone(),
                    duration: entry.record.duration,
                    base_spread: entry.record.base_spread,
                    score: entry.score,
                })
                .collect(),
            excluded: list.excluded,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LabelDump {
    pub record: usize,
    pub anchor: [f32; 2],
    pub position: [f32; 2],
    pub size: [f32; 2],
    pub connector_end: [f32; 2],
    pub lines: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SceneDump {
    pub title: String,
    pub tier: &'static str,
    pub canvas: [f32; 2],
    pub plot_area: [f32; 4],
    pub converged: bool,
    pub degenerate: bool,
    pub iterations: usize,
    pub residual_overlaps: usize,
    pub labels: Vec<LabelDump>,
}

impl From<&Scene> for SceneDump {
    fn from(scene: &Scene) -> Self {
        Self {
            title: scene.title.clone(),
            tier: scene.tier.label(),
            canvas: [scene.canvas.width(), scene.canvas.height()],
            plot_area: [
                scene.plot_area.min.x,
                scene.plot_area.min.y,
                scene.plot_area.max.x,
                scene.plot_area.max.y,
            ],
            converged: scene.layout.converged,
            degenerate: scene.layout_degenerate(),
            iterations: scene.layout.iterations,
            residual_overlaps: scene.layout.residual_overlaps,
            labels: scene
                .labels
                .iter()
                .zip(&scene.connectors)
                .map(|(label, connector)| LabelDump {
                    record: label.id.0,
                    anchor: [label.anchor.x, label.anchor.y],
                    position: [label.position.x, label.position.y],
                    size: [label.size.x, label.size.y],
                    connector_end: [connector.to.x, connector.to.y],
                    lines: label.text_lines.clone(),
                })
                .collect(),
        }
    }
}

/// Writes scenes and summaries as pretty JSON documents.
pub struct JsonSink<W: Write> {
    writer: W,
    error: Option<std::io::Error>,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    fn write_document(&mut self, document: &impl Serialize) {
        if self.error.is_some() {
            return;
        }
        let result = serde_json::to_writer_pretty(&mut self.writer, document)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(self.writer));
        if let Err(error) = result {
            self.error = Some(error);
        }
    }

    pub fn finish(mut self) -> Result<W> {
        if let Some(error) = self.error.take() {
            return Err(error).context("failed to write JSON output");
        }
        self.writer.flush().context("failed to flush JSON output")?;
        Ok(self.writer)
    }
}

impl<W: Write> RenderSink for JsonSink<W> {
    fn render(&mut self, scene: Scene) {
        self.write_document(&SceneDump::from(&scene));
    }
}

impl<W: Write> SummarySink for JsonSink<W> {
    fn summarize(&mut self, recommendations: Recommendations) {
        self.write_document(&[
            SummaryList::from(&recommendations.by_column),
            SummaryList::from(&recommendations.by_ratio),
        ]);
    }
}
