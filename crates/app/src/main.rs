use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{Parser, Subcommand};
use hue_sampler_core::{
    Clock, ColorThiefExtractor, HueError, ManualClock, Palette, PaletteExtractor, ProgressEvent,
    Sampler, SamplerConfig, SamplerOptions, SharedFrame, VideoFrame,
};
use tracing_subscriber::EnvFilter;

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];
const OVERLAY_COLUMNS: usize = 80;

fn main() -> hue_sampler_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sample {
            frames,
            fps,
            config,
            interval,
            algorithm,
            quality,
            debug,
        } => {
            let mut settings = match config {
                Some(path) => SamplerConfig::load(path)?,
                None => SamplerConfig::default(),
            };
            if let Some(interval) = interval {
                settings.sample_interval_ms = interval;
            }
            if let Some(algorithm) = algorithm {
                settings.algorithm = algorithm.into();
            }
            if let Some(quality) = quality {
                settings.quality = quality;
            }
            settings.debug |= debug;
            run_sample(&frames, fps, settings)
        }
        Commands::Palette {
            image,
            colors,
            quality,
        } => run_palette(&image, colors, quality),
    }
}

/// Plays a directory of still images as if they were video frames, firing a
/// progress event per frame and printing every sample as a JSON line.
fn run_sample(dir: &Path, fps: u32, settings: SamplerConfig) -> hue_sampler_core::Result<()> {
    let paths = frame_paths(dir)?;
    tracing::info!(frames = paths.len(), ?dir, fps, "starting playback");

    let period = Duration::from_secs(1) / fps.max(1);
    let player = settings.player.clone();
    let debug = settings.debug;

    let video = SharedFrame::new();
    let clock = ManualClock::new();
    let mut sampler = Sampler::new(video.clone()).with_clock(clock.clone());

    let options = SamplerOptions::from_config(settings).callback(|output| {
        match serde_json::to_string(output) {
            Ok(line) => println!("{line}"),
            Err(err) => tracing::warn!(error = %err, "could not encode sample"),
        }
    });
    sampler.initialize(options);

    let event = ProgressEvent::time_update(player);
    for (index, path) in paths.iter().enumerate() {
        let image = image::open(path)?;
        clock.advance(period);
        video.publish(VideoFrame::from_image(&image, clock.now(), index as u64))?;

        if sampler.dispatch(&event) && debug {
            if let Some(overlay) = sampler.overlay() {
                eprintln!("{}", overlay.render_ansi(OVERLAY_COLUMNS));
            }
        }
    }

    sampler.destroy();
    Ok(())
}

fn run_palette(path: &Path, colors: u8, quality: u8) -> hue_sampler_core::Result<()> {
    tracing::info!(?path, colors, quality, "extracting palette");

    let image = image::open(path)?;
    let frame = VideoFrame::from_image(&image, Duration::ZERO, 0);
    let mut extractor = ColorThiefExtractor::new();
    let palette = extractor.sorted_palette(&frame, colors, quality)?;
    extractor.destroy();

    println!("{}", encode_palette(&palette)?);
    Ok(())
}

fn encode_palette(palette: &Palette) -> hue_sampler_core::Result<String> {
    serde_json::to_string_pretty(palette).map_err(HueError::Encode)
}

fn frame_paths(dir: &Path) -> hue_sampler_core::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_frame = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_frame {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(HueError::msg(format!(
            "no frames found in `{}`",
            dir.display()
        )));
    }
    paths.sort();
    Ok(paths)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Throttled colour sampling of video frames", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a directory of frame images and print sampled colours as JSON lines.
    Sample {
        /// Directory containing frame images, played in file name order.
        frames: PathBuf,
        /// Simulated playback rate; one progress event is fired per frame.
        #[arg(long, default_value_t = 30)]
        fps: u32,
        /// JSON file with sampler settings. Flags below take precedence.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Minimum time between samples in milliseconds.
        #[arg(short, long)]
        interval: Option<u64>,
        /// One of dominant, brightest, average or completePalette.
        #[arg(short, long)]
        algorithm: Option<String>,
        /// Pixel stride for extraction; 1 is the most accurate.
        #[arg(short, long)]
        quality: Option<u8>,
        /// Print the palette overlay to stderr after each sample.
        #[arg(short, long)]
        debug: bool,
    },
    /// Print the brightest-first palette of a single image.
    Palette {
        image: PathBuf,
        /// Maximum number of colours to extract.
        #[arg(long, default_value_t = 10)]
        colors: u8,
        #[arg(short, long, default_value_t = 10)]
        quality: u8,
    },
}

#[cfg(test)]
mod tests {
    use hue_sampler_core::{Color, PaletteEntry};

    use super::*;

    #[test]
    fn parses_sample_overrides() {
        let cli = Cli::parse_from([
            "hue-sampler",
            "sample",
            "frames",
            "--interval",
            "250",
            "--algorithm",
            "average",
            "--debug",
        ]);

        match cli.command {
            Commands::Sample {
                frames,
                fps,
                interval,
                algorithm,
                debug,
                ..
            } => {
                assert_eq!(frames, PathBuf::from("frames"));
                assert_eq!(fps, 30);
                assert_eq!(interval, Some(250));
                assert_eq!(algorithm.as_deref(), Some("average"));
                assert!(debug);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn palette_is_printed_as_pretty_json() {
        let palette = Palette::from_entries(vec![
            PaletteEntry::new(Color::new(20, 20, 20), true),
            PaletteEntry::new(Color::new(240, 230, 90), false),
        ]);

        let json = encode_palette(&palette).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(json.contains('\n'));
        assert_eq!(value["entries"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["entries"][0]["color"], serde_json::json!([240, 230, 90]));
    }

    #[test]
    fn frame_paths_rejects_empty_directories() {
        let dir = std::env::temp_dir().join(format!("hue-sampler-empty-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let err = frame_paths(&dir).unwrap_err();
        assert!(err.to_string().contains("no frames found"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn frame_paths_are_sorted_and_filtered() {
        let dir = std::env::temp_dir().join(format!("hue-sampler-frames-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["b.png", "a.PNG", "notes.txt"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let paths = frame_paths(&dir).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.png"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
