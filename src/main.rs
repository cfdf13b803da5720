use clap::{ArgAction, CommandFactory, Parser};
use log::{debug, info, warn};
use perfscan::config::slicer::{load_config, SlicerConfig};
use perfscan::detector::HeightRange;
use perfscan::image::io::{decode_strip, encode_frame_jpeg, frame_file_name, write_json_file};
use perfscan::image::{Channel, Rotation};
use perfscan::{segment, FilmType, PerfscanError, StripDetector};
use std::path::PathBuf;

/// Slice a scanned 8mm / Super-8 film strip into one JPEG per frame.
#[derive(Debug, Parser)]
#[command(name = "perfscan", version, about, disable_help_flag = true)]
struct Cli {
    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,

    /// Verbose (-vv for more, etc)
    #[arg(short = 'v', action = ArgAction::Count)]
    verbose: u8,

    /// Only report warnings and errors
    #[arg(long)]
    quiet: bool,

    /// Frame height (needed for extraction)
    #[arg(short = 'h', long = "frame-height")]
    height: Option<usize>,

    /// Frame width (defaults to strip width minus the largest frame offset)
    #[arg(short = 'w', long = "frame-width")]
    width: Option<usize>,

    /// X offset to start horizontal perforation search at
    #[arg(short = 'x', long = "perf-x")]
    perf_x_start: Option<usize>,

    /// Y offset to start perforation detection at
    #[arg(short = 'y', long = "perf-y")]
    column_start_y: Option<usize>,

    /// Black level 0-255 (for perf detection)
    #[arg(short = 'B', long = "black")]
    black_level: Option<u8>,

    /// White level 0-255 (for perf detection)
    #[arg(short = 'W', long = "white")]
    white_level: Option<u8>,

    /// Min/max perforation height in pixels
    #[arg(short = 'p', long = "perf", value_name = "MIN-MAX")]
    perf_height: Option<HeightRange>,

    /// Min/max frame height in pixels
    #[arg(short = 'f', long = "frame", value_name = "MIN-MAX")]
    frame_height: Option<HeightRange>,

    /// Color channel R, G, B or Y (default B)
    #[arg(short = 'c', long = "channel")]
    channel: Option<Channel>,

    /// Rotate strip degrees (0 = auto, -90 forces a rotation)
    #[arg(short = 'r', long = "rotate", allow_negative_numbers = true)]
    rotate: Option<i32>,

    /// JPEG output quality (0-100), default 80
    #[arg(short = 'q', long = "quality", value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: Option<u8>,

    /// Super-8 stock: frames start half a frame above the perforation
    #[arg(long)]
    super8: bool,

    /// JSON config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base name for output frames (default: the input path)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Write the detection report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Detect only, even if a frame height is given
    #[arg(long)]
    probe: bool,

    /// Scanned film strip image
    input: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, cfg: &mut SlicerConfig) -> Result<(), PerfscanError> {
        let det = &mut cfg.detection;
        if let Some(v) = self.white_level {
            det.white_level = v;
        }
        if let Some(v) = self.black_level {
            det.black_level = v;
        }
        if let Some(v) = self.perf_height {
            det.perf_height = Some(v);
        }
        if let Some(v) = self.frame_height {
            det.frame_height = Some(v);
        }
        if let Some(v) = self.channel {
            det.channel = v;
        }
        if let Some(v) = self.perf_x_start {
            det.perf_x_start = v;
        }
        if let Some(v) = self.column_start_y {
            det.column_start_y = v;
        }
        if self.super8 {
            det.film_type = FilmType::Super8;
        }
        if let Some(deg) = self.rotate {
            cfg.rotation = match deg {
                0 => Rotation::Auto,
                -90 => Rotation::Ccw90,
                other => {
                    return Err(PerfscanError::InvalidConfig(format!(
                        "unsupported rotation {other}, only -90 is available"
                    )))
                }
            };
        }
        if let Some(v) = self.height {
            cfg.frame.height = Some(v);
        }
        if let Some(v) = self.width {
            cfg.frame.width = Some(v);
        }
        if let Some(v) = self.quality {
            cfg.output.quality = v;
        }
        if let Some(v) = &self.output {
            cfg.output.base = Some(v.clone());
        }
        if let Some(v) = &self.report {
            cfg.output.report_json = Some(v.clone());
        }
        if let Some(v) = &self.input {
            cfg.input = Some(v.clone());
        }
        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();
    configure_logs(cli.verbose, cli.quiet);

    if let Err(err) = run(&cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn configure_logs(verbose: u8, quiet: bool) {
    use simplelog::*;

    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Warn,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    let cfg = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
    if let Err(e) = TermLogger::init(level, cfg, TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("logger failed to initialize: {e}");
    }
}

fn run(cli: &Cli) -> Result<(), PerfscanError> {
    let mut cfg = match &cli.config {
        Some(path) => load_config(path)?,
        None => SlicerConfig::default(),
    };
    cli.apply(&mut cfg)?;
    cfg.validate()?;

    let Some(input) = cfg.input.clone() else {
        Cli::command()
            .error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "no input file given (pass it as an argument or in --config)",
            )
            .exit()
    };

    println!("perfscan reading file {}", input.display());
    let height = cfg.extraction_height().filter(|_| !cli.probe);
    if height.is_none() {
        println!("no frame height given, only probing");
    }

    let channel = cfg.detection.channel;
    let strip = decode_strip(&input, channel)?;
    let (strip, rotated) = strip.rotate(cfg.rotation);
    if rotated {
        info!("strip rotated -90 deg");
    }

    let limits = cfg.detection.resolve(strip.width())?;
    println!(
        "image height {} width {} components {}",
        strip.height(),
        strip.width(),
        strip.components()
    );
    println!(
        "channel: {channel} black {} white {} perf {}-{} frame {}-{}",
        limits.black_level,
        limits.white_level,
        limits.min_perf_height,
        limits.max_perf_height,
        limits.min_frame_height,
        limits.max_frame_height
    );

    let detector = StripDetector::new(cfg.detection.clone());
    let mut detection = match detector.detect(&strip) {
        Ok(d) => d,
        Err(err) if err.is_degenerate() => {
            warn!("{err}");
            println!("\nwrote 0 frames");
            return Ok(());
        }
        Err(err) => return Err(err),
    };
    let consensus = detection.consensus;
    println!(
        "global: best column {} num perfs: {} num frames: {}",
        consensus.best_column, consensus.perforations, consensus.frames
    );
    println!(
        "        frame height: max {} min {} mean {} mode {}",
        consensus.max_frame_height,
        consensus.min_frame_height,
        consensus.mean_frame_height,
        consensus.frame_height_mode
    );
    debug!(
        "detection took {:.3} ms (wide pass {:.3} ms)",
        detection.report.timings.total_ms,
        detection.report.timings.stage_ms("widePass").unwrap_or(0.0)
    );

    // a whole frame may sit above the first complete perforation
    if let Some(height) = height {
        if let Some(reg) = detector.recover_leading_frame(&strip, &mut detection, height) {
            info!("leading frame above offset {} marked at row {}", consensus.mean_offset, reg.row);
        }
    }

    if let Some(path) = &cfg.output.report_json {
        write_json_file(path, &detection.report)?;
        info!("detection report written to {}", path.display());
    }

    let Some(height) = height else {
        return Ok(());
    };
    let width = cfg
        .frame
        .width
        .unwrap_or_else(|| detection.default_frame_width(strip.width()));
    println!(
        "frame height {height} width {width}, offset {}",
        consensus.mean_offset
    );

    let base = cfg.output.base.clone().unwrap_or(input);
    let jitter = cfg.detection.jitter_limit(width);
    let mut count = 0usize;
    for frame in segment(&strip, &detection.markers, width, height)?.with_jitter_limit(jitter) {
        let path = frame_file_name(&base, frame.index());
        encode_frame_jpeg(&frame, cfg.output.quality, &path)?;
        let region = frame.region();
        debug!(
            "FRAME_START at {}, xoffs {} => {}",
            region.row,
            region.x,
            path.display()
        );
        count += 1;
    }

    println!("\nwrote {count} frames");
    Ok(())
}
