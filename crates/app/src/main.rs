use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use geoanim_core::{Draw, RecordingSurface, Scene, SteppingDriver};
use tracing_subscriber::EnvFilter;

fn main() -> geoanim_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            scene,
            output,
            max_frames,
        } => run_render(&scene, output.as_deref(), max_frames),
        Commands::Cues { scene, json } => run_cues(&scene, json),
    }
}

fn run_render(
    path: &Path,
    output: Option<&Path>,
    max_frames: Option<usize>,
) -> geoanim_core::Result<()> {
    tracing::info!(?path, ?output, max_frames, "rendering scene");

    let mut scene = Scene::load(path)?;
    let mut driver = SteppingDriver::new(RecordingSurface::new());
    if let Some(frames) = max_frames {
        driver = driver.truncate_after(frames);
    }
    scene.render(&mut driver)?;

    let frames_run = driver.frames_run();
    let surface = driver.into_surface();
    tracing::info!(
        frames = frames_run,
        attached = surface.attach_count(),
        detached = surface.detach_count(),
        "render finished"
    );

    let log = surface.into_log(scene.config().clone());
    match output {
        Some(output) => log.write_json(output)?,
        None => println!("{}", serde_json::to_string_pretty(&log)?),
    }
    Ok(())
}

fn run_cues(path: &Path, json: bool) -> geoanim_core::Result<()> {
    let mut scene = Scene::load(path)?;
    scene.cue_parts()?;

    let mut parts = Vec::with_capacity(scene.parts().len());
    for part in scene.parts() {
        let frames = part.frames();
        let elements: Vec<_> = part
            .cued_elements()
            .iter()
            .map(|element| {
                serde_json::json!({
                    "shape": element.shape().name(),
                    "effect": element.options().effect,
                    "stay": element.stay(),
                    "window": element.cue_window(),
                })
            })
            .collect();

        if !json {
            match frames {
                Some(range) => println!("part {}: frames {}..={}", part.index(), range.start, range.end),
                None => println!("part {}: not cued", part.index()),
            }
            for element in part.cued_elements() {
                let window = element
                    .cue_window()
                    .map(|w| format!("{}..={}", w.start_frame_in_part, w.end_frame_in_part))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {:<8} {:<8} {:<12} stay={}",
                    element.shape().name(),
                    element.options().effect.name(),
                    window,
                    element.stay()
                );
            }
        }

        parts.push(serde_json::json!({
            "index": part.index(),
            "duration": part.duration(),
            "frames": frames.map(|range| [range.start, range.end]),
            "elements": elements,
        }));
    }

    if json {
        let summary = serde_json::json!({
            "fps": scene.config().fps,
            "last_frame": scene.last_frame(),
            "parts": parts,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        match scene.last_frame() {
            Some(last) => println!("{} frames at {} fps", last + 1, scene.config().fps),
            None => println!("empty scene"),
        }
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Animated geometric diagrams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a scene against an in-memory surface and dump every frame.
    Render {
        /// Path to the JSON scene description.
        scene: PathBuf,
        /// Where to write the frame log. Printed to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Stop after this many frames.
        #[arg(long)]
        max_frames: Option<usize>,
    },
    /// Cue a scene and print the frame window of every part and element.
    Cues {
        /// Path to the JSON scene description.
        scene: PathBuf,
        /// Print the cue table as JSON.
        #[arg(long)]
        json: bool,
    },
}
