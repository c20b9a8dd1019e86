use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wobble_mesh::{Vertex, build_icosphere};
use wobble_shading::{
    SceneSettings, SurfaceStage, VertexStage, WobbleUniforms, color_mix, neighbour_shift_ok,
    surface_color, verify_passes,
};

#[derive(Parser)]
#[command(name = "wobble-cli", about = "Headless tools for the wobble sphere")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Displace one point of the sphere
    Sample {
        #[arg(long, allow_hyphen_values = true)]
        x: f32,
        #[arg(long, allow_hyphen_values = true)]
        y: f32,
        #[arg(long, allow_hyphen_values = true)]
        z: f32,
        /// Seconds since start
        #[arg(long, default_value = "0")]
        time: f32,
        /// Sphere radius
        #[arg(long, default_value = "2.5")]
        radius: f32,
        /// YAML preset with wobble and color values
        #[arg(long)]
        preset: Option<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Build the icosphere and report its size
    Mesh {
        #[arg(long, default_value = "2.5")]
        radius: f32,
        #[arg(long, default_value = "50")]
        detail: u32,
        #[arg(long)]
        json: bool,
    },
    /// Check that the surface and shadow-depth stages displace identically
    Verify {
        #[arg(long, default_value = "2.5")]
        radius: f32,
        #[arg(long, default_value = "50")]
        detail: u32,
        #[arg(long, default_value = "0")]
        time: f32,
        #[arg(long)]
        preset: Option<PathBuf>,
        /// Largest accepted position difference
        #[arg(long, default_value = "0")]
        tolerance: f32,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct SampleReport {
    base: Vec3,
    position: Vec3,
    normal: Vec3,
    wobble: f32,
    normalized_wobble: f32,
    color_mix: f32,
    color: Vec3,
}

#[derive(Debug, Serialize)]
struct MeshReport {
    radius: f32,
    detail: u32,
    vertices: usize,
    indices: usize,
    triangles: usize,
    min_edge: Option<f32>,
    neighbour_shift_ok: bool,
}

fn load_settings(preset: Option<&Path>) -> anyhow::Result<SceneSettings> {
    match preset {
        Some(path) => SceneSettings::load_preset(path)
            .with_context(|| format!("loading preset {}", path.display())),
        None => Ok(SceneSettings::default()),
    }
}

fn sample(direction: Vec3, radius: f32, settings: &SceneSettings) -> SampleReport {
    let vertex = Vertex::on_sphere(direction, radius);
    let uniforms = settings.wobble;
    let out = SurfaceStage.vertex(&vertex, &uniforms);
    SampleReport {
        base: vertex.position,
        position: out.position,
        normal: out.normal,
        wobble: (out.position - vertex.position).dot(vertex.normal),
        normalized_wobble: out.wobble,
        color_mix: color_mix(out.wobble),
        color: surface_color(&settings.colors, out.wobble),
    }
}

fn mesh_report(radius: f32, detail: u32) -> MeshReport {
    let mesh = build_icosphere(radius, detail);
    let min_edge = mesh.min_edge_length();
    MeshReport {
        radius,
        detail,
        vertices: mesh.vertices.len(),
        indices: mesh.indices.len(),
        triangles: mesh.triangle_count(),
        min_edge,
        neighbour_shift_ok: min_edge.is_some_and(neighbour_shift_ok),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("wobble-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", wobble_common::crate_info());
            println!("noise: {}", wobble_noise::crate_info());
            println!("mesh: {}", wobble_mesh::crate_info());
            println!("shading: {}", wobble_shading::crate_info());
            println!("assets: {}", wobble_assets::crate_info());
            println!("render: {}", wobble_render_wgpu::crate_info());
        }
        Commands::Sample {
            x,
            y,
            z,
            time,
            radius,
            preset,
            json,
        } => {
            let mut settings = load_settings(preset.as_deref())?;
            settings.wobble = settings.wobble.at_time(time);
            let direction = Vec3::new(x, y, z);
            if direction.length_squared() == 0.0 {
                anyhow::bail!("sample direction must not be zero");
            }
            let report = sample(direction, radius, &settings);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("base:     {:.5}", report.base);
                println!("position: {:.5}", report.position);
                println!("normal:   {:.5}", report.normal);
                println!(
                    "wobble:   {:.5} (normalized {:.5}, mix {:.5})",
                    report.wobble, report.normalized_wobble, report.color_mix
                );
            }
        }
        Commands::Mesh {
            radius,
            detail,
            json,
        } => {
            let report = mesh_report(radius, detail);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "icosphere r={} detail={}: {} vertices, {} indices, {} triangles",
                    report.radius, report.detail, report.vertices, report.indices, report.triangles
                );
                match report.min_edge {
                    Some(edge) => println!(
                        "min edge {edge:.5}, neighbour step {}",
                        if report.neighbour_shift_ok { "OK" } else { "TOO LARGE" }
                    ),
                    None => println!("mesh is empty"),
                }
            }
        }
        Commands::Verify {
            radius,
            detail,
            time,
            preset,
            tolerance,
            json,
        } => {
            let settings = load_settings(preset.as_deref())?;
            let uniforms: WobbleUniforms = settings.wobble.at_time(time);
            let mesh = build_icosphere(radius, detail);
            let report = verify_passes(&mesh, &uniforms);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{} vertices, max position delta {:e}, wobble range {:.4}..{:.4}",
                    report.vertices, report.max_position_delta, report.min_wobble, report.max_wobble
                );
            }
            if !report.agrees(tolerance) {
                anyhow::bail!(
                    "surface and shadow-depth positions differ by {} (tolerance {tolerance})",
                    report.max_position_delta
                );
            }
            tracing::info!("passes agree");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "wobble-cli", "sample", "--x", "-1", "--y", "0.5", "--z", "-0.25", "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Sample { x, z, json, .. } => {
                assert_eq!(x, -1.0);
                assert_eq!(z, -0.25);
                assert!(json);
            }
            _ => panic!("expected sample"),
        }
    }

    #[test]
    fn sample_moves_along_normal() {
        let settings = SceneSettings::default();
        let report = sample(Vec3::new(0.3, 0.2, -0.9), 2.5, &settings);
        let normal = report.base.normalize();
        assert!((report.position - (report.base + normal * report.wobble)).length() < 1e-5);
        assert!((report.normalized_wobble - report.wobble / 0.3).abs() < 1e-4);
    }

    #[test]
    fn mesh_report_counts() {
        let report = mesh_report(2.5, 4);
        assert_eq!(report.triangles, 20 * 25);
        assert_eq!(report.indices, report.triangles * 3);
        assert!(report.neighbour_shift_ok);
    }
}
