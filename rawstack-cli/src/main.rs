use clap::Parser;
use rawstack::io::save_preview_png;
use rawstack::{
    OutputPlane, RawDecoder, RawDumpDecoder, RawStackError, StackConfig, StackReport, Stacker,
    Statistic,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

const PREVIEW_SIZE: usize = 10;

#[derive(Parser, Debug)]
#[command(author, version, about = "Stack raw images pixel by pixel into a copy of one input")]
struct Cli {
    /// Raw files, or a single directory of raw files.
    #[arg(value_name = "INPUTS")]
    inputs: Vec<PathBuf>,
    /// Path to a JSON configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Statistic to reduce with (mean, median, summation, maximum, minimum,
    /// range, variance, standard_deviation, trimmed_mean[:N]).
    #[arg(short, long)]
    statistic: Option<String>,
    /// Outliers to drop for a trimmed mean, split evenly between both ends.
    #[arg(long)]
    trim: Option<usize>,
    /// Worker threads; 0 uses every core.
    #[arg(short, long)]
    workers: Option<usize>,
    /// Output container path (defaults to output.<ext>).
    #[arg(short, long, value_name = "OUT")]
    output: Option<PathBuf>,
    /// Index of the input whose container is patched.
    #[arg(long)]
    reference_index: Option<usize>,
    /// Also write a 16-bit grayscale PNG of the result.
    #[arg(long, value_name = "FILE")]
    preview_png: Option<PathBuf>,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum DecoderConfig {
    RawDump {
        width: usize,
        height: usize,
        #[serde(default)]
        offset: usize,
        #[serde(default = "default_bit_depth")]
        bit_depth: u32,
        #[serde(default)]
        extensions: Option<Vec<String>>,
    },
    #[default]
    Libraw,
}

fn default_bit_depth() -> u32 {
    16
}

impl DecoderConfig {
    fn build(&self) -> Result<Box<dyn RawDecoder>, Box<dyn std::error::Error>> {
        match self {
            DecoderConfig::RawDump {
                width,
                height,
                offset,
                bit_depth,
                extensions,
            } => {
                let mut decoder = RawDumpDecoder::new(*width, *height)
                    .with_offset(*offset)
                    .with_bit_depth(*bit_depth);
                if let Some(extensions) = extensions {
                    decoder = decoder.with_extensions(extensions.iter().cloned());
                }
                Ok(Box::new(decoder))
            }
            #[cfg(feature = "libraw")]
            DecoderConfig::Libraw => Ok(Box::new(rawstack::LibRawDecoder::new())),
            #[cfg(not(feature = "libraw"))]
            DecoderConfig::Libraw => Err(
                "the libraw decoder is not compiled in; rebuild with --features libraw \
                 or configure a raw_dump decoder"
                    .into(),
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    inputs: Vec<String>,
    statistic: String,
    trim: usize,
    workers: usize,
    reference_index: usize,
    output_path: Option<String>,
    summary_path: Option<String>,
    preview_png: Option<String>,
    stretch_preview: bool,
    decoder: DecoderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let cfg = StackConfig::default();
        Self {
            inputs: Vec::new(),
            statistic: cfg.statistic.name().to_string(),
            trim: 2,
            workers: cfg.workers,
            reference_index: cfg.reference_index,
            output_path: None,
            summary_path: None,
            preview_png: None,
            stretch_preview: true,
            decoder: DecoderConfig::default(),
        }
    }
}

impl Config {
    fn apply_overrides(&mut self, cli: &Cli) {
        if !cli.inputs.is_empty() {
            self.inputs = cli
                .inputs
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
        }
        if let Some(statistic) = &cli.statistic {
            self.statistic = statistic.clone();
        }
        if let Some(trim) = cli.trim {
            self.trim = trim;
        }
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if let Some(index) = cli.reference_index {
            self.reference_index = index;
        }
        if let Some(output) = &cli.output {
            self.output_path = Some(output.to_string_lossy().into_owned());
        }
        if let Some(preview) = &cli.preview_png {
            self.preview_png = Some(preview.to_string_lossy().into_owned());
        }
    }
}

#[derive(Debug, Serialize)]
struct PlaneSummary {
    min: u16,
    max: u16,
    mean: f64,
}

#[derive(Debug, Serialize)]
struct Output {
    statistic: String,
    n_images: usize,
    width: usize,
    height: usize,
    max_value: u16,
    reference: String,
    output: String,
    offset: usize,
    region_len: usize,
    file_len: usize,
    read_ms: f64,
    reduce_ms: f64,
    write_ms: f64,
    stats: PlaneSummary,
    preview: Vec<Vec<u16>>,
}

impl Output {
    fn new(plane: &OutputPlane, report: &StackReport) -> Self {
        let stats = plane.stats();
        Self {
            statistic: report.statistic.to_string(),
            n_images: report.n_images,
            width: report.width,
            height: report.height,
            max_value: report.max_value,
            reference: report.reference.display().to_string(),
            output: report.destination.display().to_string(),
            offset: report.patch.offset,
            region_len: report.patch.region_len,
            file_len: report.patch.file_len,
            read_ms: report.read_ms,
            reduce_ms: report.reduce_ms,
            write_ms: report.write_ms,
            stats: PlaneSummary {
                min: stats.min,
                max: stats.max,
                mean: stats.mean,
            },
            preview: plane.preview(PREVIEW_SIZE, PREVIEW_SIZE),
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<RawStackError>() {
                Some(RawStackError::MayBeCompressed { path }) => eprintln!(
                    "reference file '{}' appears to be compressed; choose an uncompressed reference \
                     with --reference-index",
                    path.display()
                ),
                _ => eprintln!("error: {err}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("rawstack=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let mut config: Config = match &cli.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    config.apply_overrides(&cli);
    if config.inputs.is_empty() {
        return Err("no inputs given; pass files, a directory, or set inputs in the config".into());
    }

    let statistic = Statistic::from_name(&config.statistic, config.trim)?;
    let decoder = config.decoder.build()?;
    let stacker = Stacker::new(StackConfig {
        statistic,
        workers: config.workers,
        reference_index: config.reference_index,
    })?;

    let inputs: Vec<PathBuf> = config.inputs.iter().map(PathBuf::from).collect();
    let destination = config.output_path.as_deref().map(Path::new);
    let (plane, report) = stacker.run(&inputs, decoder.as_ref(), destination)?;
    tracing::info!(
        output = %report.destination.display(),
        offset = report.patch.offset,
        "stack written"
    );

    if let Some(path) = &config.preview_png {
        save_preview_png(&plane, path, config.stretch_preview)?;
    }

    let json = serde_json::to_string_pretty(&Output::new(&plane, &report))?;
    match config.summary_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
