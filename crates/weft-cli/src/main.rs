//! weft CLI: headless simulation, method comparison and asset inspection.

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use weft_types::WeftError;

mod commands;

/// Exit code for invalid collider geometry.
const EXIT_GEOMETRY: i32 = 2;

#[derive(Parser)]
#[command(name = "weft")]
#[command(version, about = "weft: mass-spring cloth simulation")]
struct Cli {
    /// Log per-update solver summaries.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scene headless and print a per-frame summary.
    Simulate {
        /// Scene file (TOML). Command-line options override its values.
        #[arg(short, long)]
        config: Option<String>,

        /// Cloth model: grid, tshirt, or a path to an .obj file.
        #[arg(short, long)]
        model: Option<String>,

        /// Integration method (e.g. SymplecticEuler, PBD, ImplicitNewton).
        #[arg(short = 'M', long)]
        method: Option<String>,

        /// Number of frames to run.
        #[arg(short, long)]
        frames: Option<u32>,

        /// Default collider to add (sphere, capsule, box, ground,
        /// swept_sphere, swept_sphere_triangle). Repeatable.
        #[arg(long = "collider")]
        colliders: Vec<String>,

        /// Sphere-mesh file to add as a collider.
        #[arg(long)]
        sphere_mesh: Option<String>,

        /// Release the pins after this many frames.
        #[arg(long)]
        unpin_after: Option<u32>,
    },

    /// Run every method on the same scene and report timings as CSV.
    Compare {
        /// Cloth model: grid, tshirt, or a path to an .obj file.
        #[arg(short, long, default_value = "grid")]
        model: String,

        /// Number of frames per method.
        #[arg(short, long, default_value_t = 120)]
        frames: u32,

        /// Default collider to add to every run. Repeatable.
        #[arg(long = "collider")]
        colliders: Vec<String>,

        /// Output CSV file path. Printed to stdout when omitted.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Load a Wavefront file as cloth and print its statistics.
    InspectMesh {
        /// Path to the .obj file.
        path: String,
    },

    /// Parse a sphere-mesh file and print its primitives.
    InspectColliders {
        /// Path to the sphere-mesh file.
        path: String,

        /// Uniform scale applied to centers and radii.
        #[arg(long)]
        scale: Option<f32>,

        /// Print every primitive as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: logging unavailable: {e}");
    }

    let result = match cli.command {
        Commands::Simulate {
            config,
            model,
            method,
            frames,
            colliders,
            sphere_mesh,
            unpin_after,
        } => commands::simulate(&commands::SimulateArgs {
            config,
            model,
            method,
            frames,
            colliders,
            sphere_mesh,
            unpin_after,
        }),
        Commands::Compare {
            model,
            frames,
            colliders,
            output,
        } => commands::compare(&model, frames, &colliders, output.as_deref()),
        Commands::InspectMesh { path } => commands::inspect_mesh(&path),
        Commands::InspectColliders { path, scale, json } => {
            commands::inspect_colliders(&path, scale, json)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        let code = match e.downcast_ref::<WeftError>() {
            Some(WeftError::Geometry(_)) => EXIT_GEOMETRY,
            _ => 1,
        };
        std::process::exit(code);
    }
}
