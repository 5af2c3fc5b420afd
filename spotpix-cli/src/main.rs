//! spotpix command-line interface.
//!
//! Runs the centroiding pipeline over raw frame files and synthetic frames.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand};
use log::{debug, info};

use spotpix_algorithms::synthetic::SyntheticFrame;
use spotpix_algorithms::{
    process_frames, AccumulatedImage, CentroidEngine, ExposureTally, FrameResult,
    RollingSpotAverages, RollingSummary,
};
use spotpix_core::{CentroidConfig, Frame};
use spotpix_io::{write_accumulated_image, CameraGeometry, RawFrameFile, ResultWriter, SpotpixConfig};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// Frames handed to rayon at once in parallel mode.
const PARALLEL_BATCH: usize = 256;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    SpotpixIo(#[from] spotpix_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] spotpix_core::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Real-time spot detection and centroiding for imaging detectors.
#[derive(Parser)]
#[command(name = "spotpix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Centroid every frame of a raw 8-bit frame file
    Process {
        /// Input raw frame file
        input: PathBuf,

        /// Output file path (.csv, .bin or .jsonl)
        #[arg(short, long)]
        output: PathBuf,

        /// Frame width in pixels (overrides the config file)
        #[arg(long)]
        width: Option<usize>,

        /// Frame height in pixels (overrides the config file)
        #[arg(long)]
        height: Option<usize>,

        /// Bytes per row (defaults to the width)
        #[arg(long)]
        pitch: Option<usize>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write an accumulated image of all electrons to this file
        #[arg(long)]
        image: Option<PathBuf>,

        /// Bins per side of the accumulated image
        #[arg(long, default_value = "512")]
        bin_size: usize,

        /// Process frames in parallel with one engine per worker
        #[arg(long)]
        parallel: bool,
    },

    /// Show information about a raw frame file
    Info {
        /// Input raw frame file
        input: PathBuf,

        /// Frame width in pixels
        #[arg(long)]
        width: usize,

        /// Frame height in pixels
        #[arg(long)]
        height: usize,

        /// Bytes per row (defaults to the width)
        #[arg(long)]
        pitch: Option<usize>,
    },

    /// Benchmark the engine on synthetic frames
    Benchmark {
        /// Number of iterations
        #[arg(short, long, default_value = "20")]
        iterations: usize,

        /// Gaussian spots per frame
        #[arg(short, long, default_value = "200")]
        spots: usize,

        /// Frame width in pixels
        #[arg(long, default_value = "1024")]
        width: usize,

        /// Frame height in pixels
        #[arg(long, default_value = "768")]
        height: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match cli.command {
        Commands::Process {
            input,
            output,
            width,
            height,
            pitch,
            config,
            image,
            bin_size,
            parallel,
        } => {
            let settings = match &config {
                Some(path) => SpotpixConfig::from_file(path)?,
                None => SpotpixConfig::default(),
            };
            let camera = resolve_geometry(settings.camera, width, height, pitch);
            run_process(&input, &output, camera, settings.centroid, image.as_deref(), bin_size, parallel)?;
        }

        Commands::Info {
            input,
            width,
            height,
            pitch,
        } => {
            let file = RawFrameFile::open(&input, width, height, pitch.unwrap_or(width))?;

            println!("File: {}", input.display());
            println!(
                "Size: {} bytes ({:.2} MB)",
                file.file_size(),
                file.file_size() as f64 / 1_000_000.0
            );
            println!(
                "Frames: {} ({}x{}, pitch {})",
                file.frame_count(),
                file.width(),
                file.height(),
                file.pitch()
            );

            if file.frame_count() > 0 {
                let (min, max) = file.frame(0)?.intensity_range();
                println!("First frame intensity range: {} - {}", min, max);
            }
        }

        Commands::Benchmark {
            iterations,
            spots,
            width,
            height,
        } => {
            if iterations == 0 {
                return Err(CliError::InvalidArgument("iterations must be at least 1".into()));
            }
            let synthetic = SyntheticFrame::new(width, height)
                .with_background(3)
                .with_spot_grid(spots, 12.0, 1.5, 180.0);
            let frame = synthetic.frame()?;

            println!(
                "Benchmarking {}x{} frames with {} spots, {} iterations",
                width, height, spots, iterations
            );
            println!(
                "{:<10} | {:<15} | {:<15} | {:<15} | {:<8}",
                "Method", "Mean Time (ms)", "Min Time (ms)", "Max Time (ms)", "Spots"
            );
            println!("{:-<76}", "");

            for (name, use_hybrid) in [("CoM", false), ("Hybrid", true)] {
                let config = CentroidConfig::default().with_hybrid(use_hybrid);
                let mut engine = CentroidEngine::new(width, height, config)?;

                // Warmup
                let warm = engine.process(&frame)?;

                let mut times = Vec::with_capacity(iterations);
                for _ in 0..iterations {
                    let start = Instant::now();
                    engine.process(&frame)?;
                    times.push(start.elapsed().as_secs_f64() * 1000.0);
                }

                let min_time = times.iter().fold(f64::INFINITY, |a, &b| a.min(b));
                let max_time = times.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
                let mean_time = times.iter().sum::<f64>() / times.len() as f64;

                println!(
                    "{:<10} | {:<15.3} | {:<15.3} | {:<15.3} | {:<8}",
                    name,
                    mean_time,
                    min_time,
                    max_time,
                    warm.electrons().len()
                );
            }
        }
    }

    Ok(())
}

fn resolve_geometry(
    camera: CameraGeometry,
    width: Option<usize>,
    height: Option<usize>,
    pitch: Option<usize>,
) -> CameraGeometry {
    let width = width.unwrap_or(camera.width);
    CameraGeometry {
        width,
        height: height.unwrap_or(camera.height),
        // a width override invalidates the configured pitch
        pitch: pitch.unwrap_or(if width == camera.width { camera.pitch } else { width }),
    }
}

/// Per-run aggregates fed from each frame result in file order.
struct RunTotals {
    writer: ResultWriter,
    image: Option<AccumulatedImage>,
    tally: ExposureTally,
    rolling: RollingSpotAverages,
    last_summary: Option<RollingSummary>,
    com_spots: u64,
    decomposed_spots: u64,
    degraded_frames: u64,
}

impl RunTotals {
    fn record(&mut self, index: usize, result: &FrameResult) -> Result<()> {
        let frame = u32::try_from(index)
            .map_err(|_| CliError::InvalidArgument(format!("frame index {index} exceeds u32")))?;
        self.writer.write_frame(frame, result)?;
        if let Some(image) = &mut self.image {
            image.add_spots(result.electrons());
        }
        self.tally.record(result);
        if let Some(summary) = self.rolling.update(result) {
            debug!(
                "rolling: on {:.1} +/- {:.1}, off {:.1} +/- {:.1} electrons/frame",
                summary.on.total.mean, summary.on.total.stdev, summary.off.total.mean, summary.off.total.stdev
            );
            self.last_summary = Some(summary);
        }
        self.com_spots += result.com_spots.len() as u64;
        self.decomposed_spots += result.decomposed_count() as u64;
        if result.is_degraded() {
            self.degraded_frames += 1;
        }
        Ok(())
    }
}

fn run_process(
    input: &Path,
    output: &Path,
    camera: CameraGeometry,
    config: CentroidConfig,
    image_path: Option<&Path>,
    bin_size: usize,
    parallel: bool,
) -> Result<()> {
    config
        .validate(camera.width, camera.height)
        .map_err(spotpix_core::Error::from)?;
    let file = RawFrameFile::open(input, camera.width, camera.height, camera.pitch)?;
    info!(
        "{}: {} frames of {}x{}",
        input.display(),
        file.frame_count(),
        camera.width,
        camera.height
    );

    let aoi = config.effective_aoi(camera.width, camera.height);
    let mut totals = RunTotals {
        writer: ResultWriter::create_for_path(output)?,
        image: image_path.map(|_| AccumulatedImage::new(bin_size, aoi)),
        tally: ExposureTally::default(),
        rolling: RollingSpotAverages::default(),
        last_summary: None,
        com_spots: 0,
        decomposed_spots: 0,
        degraded_frames: 0,
    };

    let start = Instant::now();
    if parallel {
        let frames = file.frames().collect::<spotpix_io::Result<Vec<Frame<'_>>>>()?;
        for (batch_index, batch) in frames.chunks(PARALLEL_BATCH).enumerate() {
            let results = process_frames(camera.width, camera.height, &config, batch)?;
            for (offset, result) in results.iter().enumerate() {
                totals.record(batch_index * PARALLEL_BATCH + offset, result)?;
            }
        }
    } else {
        let mut engine = CentroidEngine::new(camera.width, camera.height, config)?;
        for (index, frame) in file.frames().enumerate() {
            let result = engine.process(&frame?)?;
            totals.record(index, &result)?;
        }
    }
    totals.writer.flush()?;
    let elapsed = start.elapsed();

    if let (Some(path), Some(image)) = (image_path, &totals.image) {
        write_accumulated_image(path, image)?;
        info!("accumulated image written to {}", path.display());
    }

    let frames = totals.tally.frames_total();
    println!(
        "Processed {} frames in {:.2}s ({:.1} frames/s)",
        frames,
        elapsed.as_secs_f64(),
        frames as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    println!("CoM spots: {}", totals.com_spots);
    println!("Decomposed spots: {}", totals.decomposed_spots);
    println!(
        "Electrons: {} total, {} signal on ({} frames), {} signal off ({} frames)",
        totals.tally.electrons_total(),
        totals.tally.electrons_on,
        totals.tally.frames_on,
        totals.tally.electrons_off,
        totals.tally.frames_off
    );
    if totals.degraded_frames > 0 {
        println!("Frames with truncated output: {}", totals.degraded_frames);
    }
    if let Some(summary) = totals.last_summary {
        println!(
            "Last {}-frame window: {:.2} +/- {:.2} electrons/frame (CoM {:.2}, hybrid {:.2})",
            spotpix_algorithms::TOTAL_WINDOW,
            summary.total.total.mean,
            summary.total.total.stdev,
            summary.total.com.mean,
            summary.total.hybrid.mean
        );
    }
    println!("Output: {}", output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_geometry() {
        let camera = CameraGeometry {
            width: 640,
            height: 480,
            pitch: 648,
        };
        assert_eq!(resolve_geometry(camera, None, None, None), camera);

        let resized = resolve_geometry(camera, Some(320), None, None);
        assert_eq!(resized.width, 320);
        assert_eq!(resized.height, 480);
        assert_eq!(resized.pitch, 320);

        assert_eq!(resolve_geometry(camera, None, Some(100), Some(700)).pitch, 700);
    }

    #[test]
    fn test_cli_parses_process() {
        let cli = Cli::try_parse_from([
            "spotpix", "process", "in.raw", "-o", "out.csv", "--width", "64", "--height", "48", "--parallel", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Process {
                width,
                height,
                parallel,
                bin_size,
                ..
            } => {
                assert_eq!(width, Some(64));
                assert_eq!(height, Some(48));
                assert!(parallel);
                assert_eq!(bin_size, 512);
            }
            _ => panic!("expected process"),
        }
    }
}
