use asset_normalizer::config::{self, ConfigError, PipelineConfig};
use asset_normalizer::imaging::{
    InpaintMethod, RealEsrgan, calculate_target_size, load_asset, measure,
};
use asset_normalizer::types::{RequestedKind, SizeMode, SuperRes};
use asset_normalizer::{output, process};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Shared flags for commands that run the pipeline. Each one overrides the
/// matching config value.
#[derive(clap::Args, Clone, Default)]
struct PipelineArgs {
    /// Canvas sizing: square, custom, power_of_two, multiple or auto
    #[arg(long)]
    size_mode: Option<String>,

    /// Square canvas side
    #[arg(long)]
    target: Option<u32>,

    /// Canvas width (with --height, implies custom mode)
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Canvas height (with --width, implies custom mode)
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Rounding step for multiple mode: 2, 4, 8 or 16
    #[arg(long)]
    multiple: Option<u32>,

    /// Processing profile: auto, pixel_art or illustration
    #[arg(long)]
    kind: Option<RequestedKind>,

    /// Super-resolution for illustrations: none or realesrgan
    #[arg(long)]
    superres: Option<SuperRes>,

    /// Fill the padded border: none, telea or ns
    #[arg(long)]
    inpaint: Option<InpaintMethod>,

    /// Fill and crop instead of padding when the image covers the canvas
    #[arg(long)]
    allow_crop: bool,

    /// Centre crops on the salient region
    #[arg(long, requires = "allow_crop")]
    saliency: bool,

    /// Append one JSON line per image to this file
    #[arg(long)]
    log: Option<PathBuf>,
}

impl PipelineArgs {
    /// Express the flags as a sparse config layer.
    fn overrides(&self) -> Result<toml::Value, ConfigError> {
        let mut output = toml::Table::new();
        let size_mode = match (&self.size_mode, self.width, self.height) {
            (Some(mode), _, _) => Some(mode.clone()),
            (None, Some(_), Some(_)) => Some("custom".to_string()),
            _ => None,
        };
        if let Some(mode) = size_mode {
            output.insert("size_mode".into(), mode.into());
        }
        for (key, value) in [
            ("target", self.target),
            ("width", self.width),
            ("height", self.height),
            ("multiple", self.multiple),
        ] {
            if let Some(v) = value {
                output.insert(key.into(), i64::from(v).into());
            }
        }
        if let Some(kind) = self.kind {
            output.insert("kind".into(), toml::Value::try_from(kind)?);
        }
        if let Some(superres) = self.superres {
            output.insert("superres".into(), toml::Value::try_from(superres)?);
        }
        if let Some(inpaint) = self.inpaint {
            output.insert("inpaint".into(), toml::Value::try_from(inpaint)?);
        }
        if self.allow_crop {
            output.insert("allow_crop".into(), true.into());
        }
        if self.saliency {
            output.insert("use_saliency".into(), true.into());
        }

        let mut root = toml::Table::new();
        if !output.is_empty() {
            root.insert("output".into(), toml::Value::Table(output));
        }
        if let Some(log) = &self.log {
            let mut processing = toml::Table::new();
            processing.insert("log_jsonl".into(), log.display().to_string().into());
            root.insert("processing".into(), toml::Value::Table(processing));
        }
        Ok(toml::Value::Table(root))
    }
}

#[derive(Parser)]
#[command(name = "asset-normalizer")]
#[command(about = "Normalize pixel art and illustrations into consistent canvases")]
#[command(long_about = "\
Normalize pixel art and illustrations into consistent canvases

Each image is classified as pixel art or illustration, trimmed of
meaningless transparent padding, scaled with the matching strategy
(whole-factor nearest-neighbour for pixel art, Lanczos for illustrations,
optionally Real-ESRGAN), padded onto the target canvas and sharpened.
Colour profiles are preserved.

Run 'asset-normalizer gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (default: asset-normalizer.toml in the working directory, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize a single image
    Process {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Normalize every image in a directory, in parallel
    Batch {
        input_dir: PathBuf,
        output_dir: PathBuf,
        /// Descend into subdirectories, mirroring them in the output
        #[arg(short, long)]
        recursive: bool,
        /// Max parallel workers (capped at the CPU count)
        #[arg(short, long)]
        jobs: Option<usize>,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Print the canvas size a mode would pick for given dimensions
    SuggestSize {
        width: u32,
        height: u32,
        /// square, custom, power_of_two, multiple or auto
        #[arg(long, default_value = "auto")]
        mode: String,
        /// Side for square mode
        #[arg(long, default_value_t = 512)]
        target: u32,
        /// Rounding step for multiple mode
        #[arg(long, default_value_t = 8)]
        multiple: u32,
    },
    /// Show whether an image is treated as pixel art or illustration
    Classify { input: PathBuf },
    /// Check that the super-resolution binary can be run
    CheckSuperres,
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    match cli.command {
        Command::Process {
            input,
            output: dst,
            pipeline,
        } => {
            let config = load(cli.config.as_deref(), &pipeline, None)?;
            let record = process::process_one(&input, &dst, &config)?;
            output::print_record(&record);
        }
        Command::Batch {
            input_dir,
            output_dir,
            recursive,
            jobs,
            pipeline,
        } => {
            let config = load(cli.config.as_deref(), &pipeline, jobs)?;
            init_thread_pool(&config.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result =
                process::process_batch(&input_dir, &output_dir, recursive, &config, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let result = result?;
            output::print_batch_summary(&result);
            if result.failed() > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::SuggestSize {
            width,
            height,
            mode,
            target,
            multiple,
        } => {
            let size_mode =
                SizeMode::from_parts(&mode, target, Some((width, height)), multiple)?;
            let size = calculate_target_size(width, height, size_mode);
            println!(
                "{}",
                output::format_suggest_size(width, height, &mode, size)
            );
        }
        Command::Classify { input } => {
            let config = load(cli.config.as_deref(), &PipelineArgs::default(), None)?;
            let asset = load_asset(&input)?;
            let params = config.classifier.params();
            let stats = measure(&asset.pixels, &params);
            output::print_classification(&input, &stats, &params);
        }
        Command::CheckSuperres => {
            let config = load(cli.config.as_deref(), &PipelineArgs::default(), None)?;
            let probe = RealEsrgan::new(config.superres.settings())
                .check_available()
                .map_err(|e| e.to_string());
            println!("{}", output::format_superres_check(&probe));
            if probe.is_err() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Layer stock defaults, the config file and command-line flags.
fn load(
    path: Option<&Path>,
    pipeline: &PipelineArgs,
    jobs: Option<usize>,
) -> Result<PipelineConfig, ConfigError> {
    let mut overrides = pipeline.overrides()?;
    if let (Some(jobs), toml::Value::Table(root)) = (jobs, &mut overrides) {
        let mut processing = match root.remove("processing") {
            Some(toml::Value::Table(table)) => table,
            _ => toml::Table::new(),
        };
        processing.insert("max_processes".into(), (jobs as i64).into());
        root.insert("processing".into(), toml::Value::Table(processing));
    }
    config::load_config(path, Some(overrides))
}

/// Initialize the rayon thread pool based on processing config.
///
/// Never exceeds the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
