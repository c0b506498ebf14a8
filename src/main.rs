use clap::{Parser, Subcommand};
use pulsly_client::editor::EditSession;
use pulsly_client::types::Photo;
use pulsly_client::update::{FsWorkerPlatform, UpdateCoordinator};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "pulsly-client")]
#[command(about = "Pulsly client core — photo editing and deploy-update watching")]
#[command(long_about = "\
Pulsly client core — photo editing and deploy-update watching

The edit commands run images through the same 400x400 editor canvas the app
uses: rotate, zoom, brightness, and contrast render into the canvas; crop
extracts a region of the flat (unrotated, unscaled) canvas and makes it the
new image.

The watch command registers against a deploy manifest (a JSON file the build
publishes, e.g. {\"version\": \"1.4.2\"}) and reports when a new build is
waiting, exactly as the in-app update banner does.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Adjustment flags for rendering through the editor canvas.
#[derive(clap::Args, Clone, Copy)]
struct AdjustArgs {
    /// Rotation in degrees (-180 to 180)
    #[arg(long, default_value_t = 0.0)]
    rotate: f32,

    /// Zoom factor (0.5 to 2.0)
    #[arg(long, default_value_t = 1.0)]
    zoom: f32,

    /// Brightness percent (50 to 150)
    #[arg(long, default_value_t = 100)]
    brightness: i32,

    /// Contrast percent (50 to 150)
    #[arg(long, default_value_t = 100)]
    contrast: i32,
}

#[derive(Subcommand)]
enum Command {
    /// Render images through the editor canvas and save them as JPEG
    Edit {
        /// Input images
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(long, default_value = "edited")]
        output: PathBuf,

        #[command(flatten)]
        adjust: AdjustArgs,

        /// Photos manifest (photos.json) to record the edit in
        #[arg(long, requires = "photo_id")]
        manifest: Option<PathBuf>,

        /// Id of the manifest entry whose url the edit replaces
        #[arg(long, requires = "manifest")]
        photo_id: Option<String>,
    },

    /// Crop a region out of an image through the editor canvas
    Crop {
        input: PathBuf,

        /// Output file
        #[arg(long)]
        output: PathBuf,

        /// Crop rectangle origin, canvas pixels
        #[arg(long, default_value_t = 24.0)]
        x: f32,
        #[arg(long, default_value_t = 24.0)]
        y: f32,

        /// Crop rectangle dimensions, canvas pixels (minimum 50)
        #[arg(long, default_value_t = 352.0)]
        width: f32,
        #[arg(long, default_value_t = 352.0)]
        height: f32,

        /// Brightness percent (50 to 150), baked into the extracted region
        #[arg(long, default_value_t = 100)]
        brightness: i32,

        /// Contrast percent (50 to 150), baked into the extracted region
        #[arg(long, default_value_t = 100)]
        contrast: i32,
    },

    /// Watch a deploy manifest and report when a new build is waiting
    Watch {
        /// Deploy manifest published by the build
        manifest: PathBuf,

        /// Hostname used to classify the poll interval
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Override the poll interval, in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Apply the update (and stop) as soon as one is waiting
        #[arg(long)]
        apply: bool,

        /// Raise system notifications for new builds
        #[arg(long)]
        notify: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Edit {
            inputs,
            output,
            adjust,
            manifest,
            photo_id,
        } => {
            if manifest.is_some() && inputs.len() != 1 {
                return Err("--manifest expects exactly one input image".into());
            }
            std::fs::create_dir_all(&output)?;

            let results: Vec<(PathBuf, Result<PathBuf, String>)> = inputs
                .par_iter()
                .map(|input| (input.clone(), edit_one(input, &output, adjust)))
                .collect();

            let mut failed = 0;
            for (pos, (input, result)) in results.iter().enumerate() {
                match result {
                    Ok(saved) => {
                        println!("{:0>3} {} → {}", pos + 1, input.display(), saved.display());
                    }
                    Err(e) => {
                        failed += 1;
                        println!("{:0>3} {} → FAILED: {}", pos + 1, input.display(), e);
                    }
                }
            }

            if let (Some(manifest_path), Some(id)) = (manifest, photo_id) {
                if let (_, Ok(saved)) = &results[0] {
                    record_in_manifest(&manifest_path, &id, saved)?;
                    println!("Manifest: {} → {}", id, saved.display());
                }
            }

            if failed > 0 {
                return Err(format!("{failed} image(s) failed").into());
            }
        }
        Command::Crop {
            input,
            output,
            x,
            y,
            width,
            height,
            brightness,
            contrast,
        } => {
            let mut session = EditSession::open(&input)?;
            session.set_brightness(brightness);
            session.set_contrast(contrast);
            session.enter_crop_mode();
            session.set_crop_rect(x, y, width, height);
            session.commit_crop();

            let (w, h) = session.source().dimensions();
            image::DynamicImage::ImageRgba8(session.source().clone())
                .to_rgb8()
                .save(&output)?;
            println!("Cropped {w}x{h} region → {}", output.display());
        }
        Command::Watch {
            manifest,
            host,
            interval_ms,
            apply,
            notify,
        } => {
            watch(&manifest, &host, interval_ms, apply, notify)?;
        }
    }

    Ok(())
}

/// Run one image through the editor canvas and save it next to the others.
fn edit_one(input: &Path, output_dir: &Path, adjust: AdjustArgs) -> Result<PathBuf, String> {
    let mut session = EditSession::open(input).map_err(|e| e.to_string())?;
    session.set_rotation(adjust.rotate);
    session.set_zoom(adjust.zoom);
    session.set_brightness(adjust.brightness);
    session.set_contrast(adjust.contrast);

    // Batch output: skip the interactive save's latency floor.
    let bytes = session
        .save_with_min_latency(Duration::ZERO)
        .map_err(|e| e.to_string())?;

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let path = output_dir.join(format!("{stem}.jpg"));
    std::fs::write(&path, bytes).map_err(|e| e.to_string())?;
    Ok(path)
}

/// Replace the url of one entry in a photos manifest.
fn record_in_manifest(
    manifest_path: &Path,
    photo_id: &str,
    saved: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(manifest_path)?;
    let mut photos: Vec<Photo> = serde_json::from_str(&content)?;

    let photo = photos
        .iter_mut()
        .find(|p| p.id == photo_id)
        .ok_or_else(|| format!("no photo with id {photo_id} in {}", manifest_path.display()))?;
    photo.replace_url(saved.to_string_lossy());

    let json = serde_json::to_string_pretty(&photos)?;
    std::fs::write(manifest_path, json)?;
    Ok(())
}

/// Run the update coordinator against a deploy manifest until interrupted
/// (or, with `--apply`, until the reload onto the new build).
fn watch(
    manifest: &Path,
    host: &str,
    interval_ms: Option<u64>,
    apply: bool,
    notify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let platform = FsWorkerPlatform::new(manifest, notify);
    let coordinator = match interval_ms {
        Some(ms) => UpdateCoordinator::with_poll_interval(platform, Duration::from_millis(ms)),
        None => UpdateCoordinator::new(platform, host),
    };

    let (tx, rx) = std::sync::mpsc::channel();
    coordinator.set_listener(tx);
    coordinator.start();
    println!(
        "==> Watching {} every {:?}",
        manifest.display(),
        coordinator.poll_interval()
    );

    for event in rx {
        println!("Update available: {}", event.version);
        if apply {
            coordinator.apply_update();
            if coordinator.platform().reload_requested() {
                println!("==> Reload triggered — {} is now active", event.version);
                return Ok(());
            }
        }
    }
    Ok(())
}
