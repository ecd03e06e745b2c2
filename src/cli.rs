//! Command line interface

use std::path::PathBuf;

use byte_unit::Byte;
use clap::{Args, Parser, Subcommand};

use crate::analyze::{AnalyzeOptions, OutputFormat};
use crate::generate::ImageSize;

#[derive(Debug, Parser)]
#[command(name = "pull-benchmark", version, about = "Benchmark container image pulls on Kubernetes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a synthetic image of random layers into the local Docker daemon
    Generate(GenerateArgs),
    /// Measure pull times of images on every schedulable node
    Measure(MeasureArgs),
    /// Measure create and update pulls over a grid of image shapes
    Suite(SuiteArgs),
    /// Render charts comparing stored results
    Analyze(AnalyzeArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[arg(long)]
    pub image_name: String,

    #[arg(long)]
    pub layer_count: usize,

    /// Total image size, divided evenly over the layers
    #[arg(long, value_parser = parse_byte_size, conflicts_with = "layer_size", required_unless_present = "layer_size")]
    pub image_size: Option<u64>,

    /// Size of each layer
    #[arg(long, value_parser = parse_byte_size)]
    pub layer_size: Option<u64>,
}

impl GenerateArgs {
    pub fn size(&self) -> Option<ImageSize> {
        match (self.image_size, self.layer_size) {
            (Some(total), _) => Some(ImageSize::Total(total)),
            (None, Some(layer)) => Some(ImageSize::PerLayer(layer)),
            (None, None) => None,
        }
    }
}

/// Cluster connection flags shared by `measure` and `suite`
#[derive(Debug, Args)]
pub struct ClusterArgs {
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Defaults to the configured namespace
    #[arg(long)]
    pub namespace: Option<String>,
}

#[derive(Debug, Args)]
pub struct MeasureArgs {
    #[arg(long)]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub cluster: ClusterArgs,

    #[arg(long, required = true, num_args = 1..)]
    pub images: Vec<String>,
}

#[derive(Debug, Args)]
pub struct SuiteArgs {
    #[arg(long)]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub name: String,

    #[command(flatten)]
    pub cluster: ClusterArgs,

    #[arg(long)]
    pub registry: Option<String>,

    #[arg(long)]
    pub repository: Option<String>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[arg(long)]
    pub output_dir: PathBuf,

    #[arg(long, required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Png)]
    pub format: OutputFormat,

    /// Names of the inputs, in path order
    #[arg(long, num_args = 1..)]
    pub labels: Vec<String>,

    /// Plot per-node pull timelines of a single input
    #[arg(long)]
    pub timeline: bool,
}

impl From<AnalyzeArgs> for AnalyzeOptions {
    fn from(args: AnalyzeArgs) -> Self {
        Self {
            output_dir: args.output_dir,
            paths: args.paths,
            format: args.format,
            labels: args.labels,
            timeline: args.timeline,
        }
    }
}

/// Parse sizes such as `10MiB`, `1GiB` or `500MB`
pub fn parse_byte_size(s: &str) -> Result<u64, String> {
    Byte::parse_str(s, true)
        .map(|b| b.as_u64())
        .map_err(|e| format!("invalid size {s:?}: {e}"))
}
