//! Comparison charts over stored results
//!
//! Inputs are result or suite files, or directories of them. Every input is
//! flattened into an ordered list of labelled series; inputs compared with
//! each other must agree on series count, series identity, and measurement
//! count. Charts are written to the output directory under the basename of
//! the input file.

mod html;
mod png;
pub mod stats;
pub mod timeline;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use strum::{Display, EnumString};
use tracing::{info, instrument};

use crate::error::{BenchError, BenchResult};
use crate::models::Benchmark;
use crate::store::{read_document, Document};

pub use stats::{summary, Summary};
pub use timeline::{build_timeline, TimelinePanel};

pub const CHART_TITLE: &str = "Image Pull Duration";
pub const Y_AXIS_LABEL: &str = "Pull Time (seconds)";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, clap::ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Html,
}

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub output_dir: PathBuf,
    pub paths: Vec<PathBuf>,
    pub format: OutputFormat,
    /// Overrides the input names derived from the paths
    pub labels: Vec<String>,
    pub timeline: bool,
}

/// A benchmark under the name it is compared by
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub benchmark: Benchmark,
}

/// One loaded input file
#[derive(Debug, Clone)]
pub struct Input {
    pub name: String,
    pub series: Vec<Series>,
}

/// Pull durations of every input for one series
#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub title: String,
    /// One sample per input, in seconds
    pub samples: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub inputs: Vec<String>,
    pub panels: Vec<Panel>,
}

/// Read a result or suite file into ordered series
pub fn load_series(path: &Path) -> BenchResult<Vec<Series>> {
    let series = match read_document(path)? {
        Document::Suite(suite) => suite
            .series()
            .into_iter()
            .map(|(label, benchmark)| Series {
                label,
                benchmark: benchmark.clone(),
            })
            .collect(),
        Document::Result(result) => result
            .benchmarks
            .into_iter()
            .map(|benchmark| Series {
                label: benchmark.image.clone(),
                benchmark,
            })
            .collect(),
    };
    Ok(series)
}

/// Name of the directory holding the file, else the file stem
pub fn default_label(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .or_else(|| path.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Check that all inputs can be compared series by series
pub fn validate(inputs: &[Input]) -> BenchResult<()> {
    let Some((first, rest)) = inputs.split_first() else {
        return Ok(());
    };
    for other in rest {
        if other.series.len() != first.series.len() {
            return Err(BenchError::mismatch(
                "results cant have different benchmark counts",
            ));
        }
        for (a, b) in first.series.iter().zip(&other.series) {
            if a.benchmark.measurements.len() != b.benchmark.measurements.len() {
                return Err(BenchError::mismatch(
                    "benchmarks cant have different measurement counts",
                ));
            }
            if a.label != b.label {
                return Err(BenchError::mismatch(format!(
                    "benchmark images are not the same: {} != {}",
                    a.label, b.label
                )));
            }
        }
    }
    Ok(())
}

/// Validate the inputs and pair up their samples per series
pub fn compare(inputs: &[Input]) -> BenchResult<Comparison> {
    validate(inputs)?;
    let panels = match inputs.first() {
        Some(first) => first
            .series
            .iter()
            .enumerate()
            .map(|(i, series)| Panel {
                title: series.label.clone(),
                samples: inputs
                    .iter()
                    .map(|input| input.series[i].benchmark.durations_secs())
                    .collect(),
            })
            .collect(),
        None => Vec::new(),
    };
    Ok(Comparison {
        inputs: inputs.iter().map(|i| i.name.clone()).collect(),
        panels,
    })
}

/// Every `.json` file directly inside `dir`, by name
fn json_files(dir: &Path) -> BenchResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".json") {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Group input paths into sets of files compared with each other
///
/// Files form a single group. For directories, every file of the first
/// directory is paired with the same-named file in the others.
pub fn group_paths(paths: &[PathBuf]) -> BenchResult<Vec<Vec<PathBuf>>> {
    let dirs = paths.iter().filter(|p| p.is_dir()).count();
    if dirs == 0 {
        return Ok(vec![paths.to_vec()]);
    }
    if dirs != paths.len() {
        return Err(BenchError::config(
            "paths must be either all files or all directories",
        ));
    }

    let groups = json_files(&paths[0])?
        .into_iter()
        .map(|name| paths.iter().map(|dir| dir.join(&name)).collect())
        .collect();
    Ok(groups)
}

fn output_path(output_dir: &Path, input: &Path, extension: &str) -> BenchResult<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| BenchError::config(format!("invalid input path {}", input.display())))?;
    let path = output_dir.join(stem).with_extension(extension);
    if path == input {
        return Err(BenchError::config(format!(
            "output {} would overwrite its input",
            path.display()
        )));
    }
    Ok(path)
}

fn input_names(options: &AnalyzeOptions, group: &[PathBuf]) -> BenchResult<Vec<String>> {
    if options.labels.is_empty() {
        let names: Vec<_> = group.iter().map(|p| default_label(p)).collect();
        if all_unique(&names) {
            return Ok(names);
        }
        // files sharing a directory are told apart by their own names
        let stems: Vec<_> = group
            .iter()
            .map(|p| {
                p.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| p.display().to_string())
            })
            .collect();
        if all_unique(&stems) {
            return Ok(stems);
        }
        return Err(BenchError::config(
            "inputs have duplicate names, set labels to tell them apart",
        ));
    }
    if options.labels.len() != group.len() {
        return Err(BenchError::config(format!(
            "expected {} labels but got {}",
            group.len(),
            options.labels.len()
        )));
    }
    if !all_unique(&options.labels) {
        return Err(BenchError::config("labels must be unique"));
    }
    Ok(options.labels.clone())
}

fn all_unique(names: &[String]) -> bool {
    let mut seen = HashSet::new();
    names.iter().all(|name| seen.insert(name))
}

/// Render every chart the options describe and return the written files
#[instrument(skip_all, fields(format = %options.format, timeline = options.timeline))]
pub fn analyze(options: &AnalyzeOptions) -> BenchResult<Vec<PathBuf>> {
    if options.timeline {
        if options.paths.len() != 1 {
            return Err(BenchError::config("timeline requires exactly one path"));
        }
    } else if options.paths.len() < 2 {
        return Err(BenchError::config("comparison requires at least two paths"));
    }

    let groups = group_paths(&options.paths)?;
    fs::create_dir_all(&options.output_dir)?;

    let mut written = Vec::new();
    for group in groups {
        let mut files = if options.timeline {
            render_timeline(options, &group[0])?
        } else {
            render_comparison(options, &group)?
        };
        for file in &files {
            info!(path = %file.display(), "wrote chart");
        }
        written.append(&mut files);
    }
    Ok(written)
}

fn render_comparison(options: &AnalyzeOptions, group: &[PathBuf]) -> BenchResult<Vec<PathBuf>> {
    let names = input_names(options, group)?;
    let inputs = group
        .iter()
        .zip(names)
        .map(|(path, name)| {
            Ok(Input {
                name,
                series: load_series(path)?,
            })
        })
        .collect::<BenchResult<Vec<_>>>()?;
    let comparison = compare(&inputs)?;

    match options.format {
        OutputFormat::Png => {
            let path = output_path(&options.output_dir, &group[0], "png")?;
            png::draw_comparison(&path, &comparison)?;
            Ok(vec![path])
        }
        OutputFormat::Html => {
            let html_path = output_path(&options.output_dir, &group[0], "html")?;
            let json_path = output_path(&options.output_dir, &group[0], "json")?;
            html::write_comparison(&html_path, &json_path, &comparison)?;
            Ok(vec![html_path, json_path])
        }
    }
}

fn render_timeline(options: &AnalyzeOptions, path: &Path) -> BenchResult<Vec<PathBuf>> {
    let series = load_series(path)?;
    let panels = build_timeline(&series);

    match options.format {
        OutputFormat::Png => {
            let out = output_path(&options.output_dir, path, "png")?;
            png::draw_timeline(&out, &panels)?;
            Ok(vec![out])
        }
        OutputFormat::Html => {
            let html_path = output_path(&options.output_dir, path, "html")?;
            let json_path = output_path(&options.output_dir, path, "json")?;
            html::write_timeline(&html_path, &json_path, &panels)?;
            Ok(vec![html_path, json_path])
        }
    }
}
