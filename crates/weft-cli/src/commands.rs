//! CLI command implementations.

use std::error::Error;
use std::fmt::Write as _;
use std::time::Instant;

use weft_contact::sphere_mesh::{DEFAULT_SPHERE_MESH_SCALE, DEFAULT_SPHERE_MESH_TRANSLATION};
use weft_contact::{Collider, SphereMeshCollider};
use weft_math::Vec3;
use weft_mesh::obj::load_obj;
use weft_mesh::ClothMesh;
use weft_solver::{ClothInstance, ClothModel, ColliderSpec, Method, SceneConfig};
use weft_types::WeftResult;

type CliResult = Result<(), Box<dyn Error>>;

/// Frames between progress lines in `simulate`.
const REPORT_INTERVAL: u32 = 10;

/// Options of the `simulate` subcommand. `None` keeps the scene's value.
pub struct SimulateArgs {
    pub config: Option<String>,
    pub model: Option<String>,
    pub method: Option<String>,
    pub frames: Option<u32>,
    pub colliders: Vec<String>,
    pub sphere_mesh: Option<String>,
    pub unpin_after: Option<u32>,
}

/// What one headless run produced.
#[derive(Debug, Clone, Default)]
struct RunSummary {
    frames: u32,
    wall_time: f64,
    final_residual: f64,
    converged_frames: u32,
    contacts: u64,
    lowest_y: f32,
}

impl RunSummary {
    fn avg_frame_ms(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.wall_time * 1000.0 / self.frames as f64
        }
    }
}

/// Run a scene headless.
pub fn simulate(args: &SimulateArgs) -> CliResult {
    let mut scene = match &args.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    if let Some(model) = &args.model {
        scene.model = model.parse()?;
    }
    if let Some(method) = &args.method {
        scene.method = method.parse()?;
    }
    if let Some(frames) = args.frames {
        scene.frames = frames;
    }
    if args.unpin_after.is_some() {
        scene.unpin_after = args.unpin_after;
    }
    for kind in &args.colliders {
        scene.colliders.push(ColliderSpec::default_of(kind)?);
    }
    if let Some(path) = &args.sphere_mesh {
        scene.colliders.push(ColliderSpec::SphereMesh {
            path: path.into(),
            scale: None,
            translation: None,
        });
    }

    println!("weft simulation");
    println!("───────────────");
    println!("Model:      {}", describe_model(&scene.model));
    println!("Method:     {}", scene.method);
    println!("Frames:     {}", scene.frames);
    println!("Colliders:  {}", scene.colliders.len());
    println!();

    let mut instance = build_instance(&scene, scene.method)?;
    let stats = instance.cloth().stats();
    println!(
        "Cloth: {} nodes, {} triangles, {} springs, {} pinned",
        stats.nodes, stats.triangles, stats.springs, stats.pinned
    );
    println!();

    let summary = run(&mut instance, scene.frames, scene.unpin_after, true)?;

    println!();
    println!("Wall time:        {:.3}s", summary.wall_time);
    println!("Avg frame:        {:.3}ms", summary.avg_frame_ms());
    println!("Final residual:   {:.6e}", summary.final_residual);
    println!("Converged frames: {}/{}", summary.converged_frames, summary.frames);
    println!("Contacts:         {}", summary.contacts);
    println!("Lowest node y:    {:.4}", summary.lowest_y);
    Ok(())
}

/// Run every method on the same scene and report as CSV.
pub fn compare(model: &str, frames: u32, colliders: &[String], output: Option<&str>) -> CliResult {
    let mut scene = SceneConfig {
        model: model.parse()?,
        frames,
        ..SceneConfig::default()
    };
    for kind in colliders {
        scene.colliders.push(ColliderSpec::default_of(kind)?);
    }

    println!("weft method comparison");
    println!("══════════════════════");
    println!("Model: {}, {} frames", describe_model(&scene.model), frames);
    println!();

    let mut csv = String::from(
        "method,frames,wall_time_s,avg_frame_ms,final_residual,converged_frames,contacts,lowest_y,error\n",
    );
    for method in Method::ALL {
        println!("Running: {method}");
        let outcome = build_instance(&scene, method)
            .and_then(|mut instance| run(&mut instance, frames, None, false));
        match outcome {
            Ok(s) => {
                println!("  Avg frame:  {:.3}ms", s.avg_frame_ms());
                println!("  Residual:   {:.6e}", s.final_residual);
                writeln!(
                    csv,
                    "{},{},{:.6},{:.6},{:.6e},{},{},{:.6},",
                    method,
                    s.frames,
                    s.wall_time,
                    s.avg_frame_ms(),
                    s.final_residual,
                    s.converged_frames,
                    s.contacts,
                    s.lowest_y
                )?;
            }
            Err(e) => {
                println!("  Failed:     {e}");
                writeln!(csv, "{method},0,0,0,0,0,0,0,\"{e}\"")?;
            }
        }
    }
    println!();

    if let Some(path) = output {
        std::fs::write(path, &csv)?;
        println!("Results written to: {path}");
    } else {
        println!("CSV Output:");
        print!("{csv}");
    }
    Ok(())
}

/// Load a Wavefront file as cloth and print its statistics.
pub fn inspect_mesh(path: &str) -> CliResult {
    println!("weft mesh inspector");
    println!("───────────────────");
    println!();

    let cloth = load_obj(path)?;
    print_cloth(&cloth);
    match cloth.validate() {
        Ok(()) => println!("Mesh is valid."),
        Err(e) => println!("Mesh validation failed: {e}"),
    }
    Ok(())
}

/// Parse a sphere-mesh file and print its primitives.
pub fn inspect_colliders(path: &str, scale: Option<f32>, json: bool) -> CliResult {
    let text = std::fs::read_to_string(path)?;
    let collider = SphereMeshCollider::parse(
        &text,
        scale.unwrap_or(DEFAULT_SPHERE_MESH_SCALE),
        DEFAULT_SPHERE_MESH_TRANSLATION,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&collider.shape())?);
        return Ok(());
    }

    println!("weft sphere-mesh inspector");
    println!("──────────────────────────");
    println!();
    println!("Triangles:  {}", collider.triangle_count());
    println!("Edges:      {}", collider.edge_count());
    println!("Primitives: {}", collider.primitives().len());
    for (i, primitive) in collider.primitives().iter().enumerate() {
        println!("  [{i:>3}] {}", primitive.name());
    }
    Ok(())
}

fn build_instance(scene: &SceneConfig, method: Method) -> WeftResult<ClothInstance> {
    let mut instance = ClothInstance::new(scene.model.clone(), method, scene.simulation.clone())?;
    for spec in &scene.colliders {
        instance.add_collider(spec.build()?);
    }
    Ok(instance)
}

fn run(
    instance: &mut ClothInstance,
    frames: u32,
    unpin_after: Option<u32>,
    report: bool,
) -> WeftResult<RunSummary> {
    let mut summary = RunSummary::default();
    let start = Instant::now();

    for frame in 0..frames {
        if unpin_after == Some(frame) {
            instance.unpin();
            if report {
                println!("frame {frame:>5}  pins released");
            }
        }
        let result = instance.update()?;

        summary.frames += 1;
        summary.final_residual = result.residual;
        summary.contacts += u64::from(result.contacts.resolved_count);
        if result.converged {
            summary.converged_frames += 1;
        }
        if report && (frame + 1) % REPORT_INTERVAL == 0 {
            println!(
                "frame {:>5}  residual {:.4e}  iterations {:>3}  contacts {:>5}  {:.2}ms",
                frame + 1,
                result.residual,
                result.iterations,
                result.contacts.resolved_count,
                result.wall_time * 1000.0
            );
        }
    }

    summary.wall_time = start.elapsed().as_secs_f64();
    summary.lowest_y = instance
        .world_positions()
        .iter()
        .map(|p| p.y)
        .fold(f32::INFINITY, f32::min);
    Ok(summary)
}

fn describe_model(model: &ClothModel) -> String {
    match model {
        ClothModel::Grid(spec) => {
            format!("grid {}x{} ({} per unit)", spec.rows, spec.cols, spec.density)
        }
        ClothModel::Surface { path } => path.display().to_string(),
    }
}

fn print_cloth(cloth: &ClothMesh) {
    let stats = cloth.stats();
    let [structural, shear_a, shear_b, bending] = stats.springs_by_kind;
    println!("Nodes:      {}", stats.nodes);
    println!("Triangles:  {}", stats.triangles);
    println!("Springs:    {}", stats.springs);
    println!("  structural {structural}, shear {}, bending {bending}", shear_a + shear_b);
    println!("Pinned:     {}", stats.pinned);

    if !cloth.is_empty() {
        let (min, max) = cloth.nodes.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(lo, hi), n| (lo.min(n.position), hi.max(n.position)),
        );
        println!(
            "Bounds:     [{:.3}, {:.3}, {:.3}] .. [{:.3}, {:.3}, {:.3}]",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }
}
