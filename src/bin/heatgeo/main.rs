//! heatgeo CLI - geodesic distances with the heat method.
//!
//! Usage: heatgeo <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `heatgeo --help` for available commands. Log output is controlled with
//! `RUST_LOG`; `--verbose` raises the default level.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use heatgeo::algo::geodesic::operators::characteristic_edge_length;
use heatgeo::algo::geodesic::{
    heat_method_multiple, BoundaryPolicy, GradientScheme, HeatMethodOptions,
};
use heatgeo::error::GeodesicError;
use heatgeo::io;
use heatgeo::mesh::{HalfEdgeMesh, VertexId};

#[derive(Parser)]
#[command(name = "heatgeo")]
#[command(author, version, about = "Heat method geodesic distances", long_about = None)]
struct Cli {
    /// Log pipeline stages; repeat for full intermediate dumps
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information and the default diffusion timestep
    Info {
        /// Input mesh file (.ply or .stl)
        input: PathBuf,

        /// Timestep multiplier used for the reported timestep
        #[arg(short, long, default_value = "1.0")]
        multiplier: f64,
    },

    /// Compute the distance field from one or more source vertices
    Distance {
        /// Input mesh file (.ply or .stl)
        input: PathBuf,

        /// Output file: .ply stores the field as vertex quality, .txt as plain text
        output: PathBuf,

        /// Source vertex index (repeat for several sources)
        #[arg(short, long = "source", default_value = "0")]
        sources: Vec<usize>,

        /// Timestep multiplier m in t = m * h^2
        #[arg(short, long, default_value = "1.0")]
        multiplier: f64,

        /// Explicit diffusion time (overrides the multiplier)
        #[arg(short, long)]
        time_step: Option<f64>,

        /// Diagonal regularization of the Poisson system
        #[arg(long, default_value = "1e-6")]
        regularization: f64,

        /// Gradient and divergence discretization
        #[arg(long, value_enum, default_value = "per-face")]
        scheme: Scheme,

        /// Fail on meshes with boundary edges instead of using one-sided weights
        #[arg(long)]
        reject_boundary: bool,

        /// Write the raw field without shifting its minimum to zero
        #[arg(long)]
        raw: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Scheme {
    /// Per-face gradient from all three corner values
    PerFace,
    /// Per-vertex gradient from the vertex's own value
    VertexLumped,
}

impl From<Scheme> for GradientScheme {
    fn from(s: Scheme) -> Self {
        match s {
            Scheme::PerFace => GradientScheme::PerFace,
            Scheme::VertexLumped => GradientScheme::VertexLumped,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let dump = cli.verbose > 1;
    match cli.command {
        Commands::Info { input, multiplier } => {
            cmd_info(&input, multiplier)?;
        }

        Commands::Distance {
            input,
            output,
            sources,
            multiplier,
            time_step,
            regularization,
            scheme,
            reject_boundary,
            raw,
        } => {
            let boundary = if reject_boundary {
                BoundaryPolicy::Reject
            } else {
                BoundaryPolicy::OneSided
            };
            let mut options = HeatMethodOptions::default()
                .with_timestep_multiplier(multiplier)
                .with_regularization(regularization)
                .with_gradient_scheme(scheme.into())
                .with_boundary_policy(boundary)
                .with_verbose(dump);
            if let Some(t) = time_step {
                options = options.with_time_step(t);
            }
            cmd_distance(&input, &output, &sources, &options, raw)?;
        }
    }

    Ok(())
}

fn cmd_info(input: &PathBuf, multiplier: f64) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Half-edges: {}", mesh.num_halfedges());
    println!("Surface area: {:.6}", mesh.surface_area());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    let boundary_verts = mesh
        .vertex_ids()
        .filter(|&v| mesh.is_boundary_vertex(v))
        .count();
    if boundary_verts == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary vertices)", boundary_verts);
    }

    let isolated = mesh
        .vertex_ids()
        .filter(|&v| mesh.is_isolated_vertex(v))
        .count();
    if isolated > 0 {
        println!("Isolated vertices: {}", isolated);
    }

    let h = characteristic_edge_length(&mesh);
    let options = HeatMethodOptions::default().with_timestep_multiplier(multiplier);
    println!("Edge scale h: {:.6}", h);
    println!("Timestep t: {:.6e} (m = {})", options.timestep(h), multiplier);

    Ok(())
}

fn cmd_distance(
    input: &PathBuf,
    output: &PathBuf,
    sources: &[usize],
    options: &HeatMethodOptions,
    raw: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;
    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let sources = source_ids(sources, mesh.num_vertices())?;

    let start = Instant::now();
    let mut result = heat_method_multiple(&mesh, &sources, options)?;
    let elapsed = start.elapsed();
    if !raw {
        result = result.shifted_to_min();
    }

    match result.farthest_vertex() {
        Some((v, d)) => println!(
            "Computed {} distances in {:.2?} (farthest: vertex {} at {:.6})",
            result.len(),
            elapsed,
            v.index(),
            d
        ),
        None => println!("Computed {} distances in {:.2?}", result.len(), elapsed),
    }

    io::save_field(&mesh, result.distances(), output)?;
    println!("Saved: {}", output.display());

    Ok(())
}

/// Range-check raw indices before they are narrowed into vertex ids.
fn source_ids(sources: &[usize], num_vertices: usize) -> Result<Vec<VertexId>, GeodesicError> {
    sources
        .iter()
        .map(|&s| {
            if s < num_vertices {
                Ok(VertexId::new(s))
            } else {
                Err(GeodesicError::SourceOutOfRange {
                    vertex: s,
                    num_vertices,
                })
            }
        })
        .collect()
}
