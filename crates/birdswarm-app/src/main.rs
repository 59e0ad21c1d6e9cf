use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use birdswarm_core::{
    BoundaryPolicy, Coefficients, ConvergencePolicy, PsoConfig, RunOutcome, Simulation,
    TerrainConfig,
};
use clap::{Parser, ValueEnum};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "birdswarm",
    version,
    about = "Run a bird-swarm PSO simulation and emit the frame sequence as JSON"
)]
struct Cli {
    /// Number of birds in the flock.
    #[arg(long, default_value_t = 50)]
    particles: usize,

    /// Iteration budget for the run.
    #[arg(long, default_value_t = 120)]
    iterations: u32,

    /// RNG seed; omit for a fresh random run.
    #[arg(long)]
    seed: Option<u64>,

    /// Side length of the terrain grid in cells.
    #[arg(long, default_value_t = 50)]
    map_size: u32,

    /// Terrain noise seed.
    #[arg(long, default_value_t = 0)]
    terrain_seed: u64,

    /// Base noise frequency, in cycles across the map.
    #[arg(long, default_value_t = 3.0)]
    scale: f32,

    /// Elevation redistribution exponent.
    #[arg(long, default_value_t = 2.0)]
    exponent: f32,

    /// Number of noise octaves.
    #[arg(long, default_value_t = 4)]
    octaves: u32,

    /// Per-component speed cap, in cells per iteration.
    #[arg(long, default_value_t = 2.0)]
    max_speed: f32,

    /// Inertia weight applied to the previous velocity.
    #[arg(long, default_value_t = 0.729)]
    inertia: f32,

    /// Pull strength toward each bird's own best position.
    #[arg(long, default_value_t = 1.49445)]
    cognitive_weight: f32,

    /// Pull strength toward the flock's best position.
    #[arg(long, default_value_t = 1.49445)]
    social_weight: f32,

    /// Magnitude of the random exploration impulse.
    #[arg(long, default_value_t = 0.02)]
    random_weight: f32,

    /// How birds hitting the map edge are handled.
    #[arg(long, value_enum, default_value_t = BoundaryArg::ClampZero)]
    boundary: BoundaryArg,

    /// Stop after this many consecutive non-improving iterations.
    #[arg(long)]
    patience: Option<u32>,

    /// Largest per-iteration gain still counted as non-improving.
    #[arg(long, default_value_t = 1e-3)]
    tolerance: f32,

    /// Let the auto-tuner shift coefficients as the flock converges.
    #[arg(long)]
    auto_tune: bool,

    /// Where to write the JSON frame sequence (`-` for stdout).
    #[arg(long, short, default_value = "-")]
    output: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BoundaryArg {
    /// Clamp to the edge and zero the offending velocity component.
    ClampZero,
    /// Clamp to the edge and bounce the offending component back.
    Reflect,
}

impl From<BoundaryArg> for BoundaryPolicy {
    fn from(arg: BoundaryArg) -> Self {
        match arg {
            BoundaryArg::ClampZero => BoundaryPolicy::ClampZero,
            BoundaryArg::Reflect => BoundaryPolicy::Reflect,
        }
    }
}

impl Cli {
    fn to_config(&self) -> PsoConfig {
        PsoConfig {
            particles: self.particles,
            terrain: TerrainConfig {
                size: self.map_size,
                seed: self.terrain_seed,
                scale: self.scale,
                exponent: self.exponent,
                octaves: self.octaves,
                ..TerrainConfig::default()
            },
            coefficients: Coefficients {
                inertia: self.inertia,
                cognitive: self.cognitive_weight,
                social: self.social_weight,
                random_weight: self.random_weight,
            },
            max_iterations: self.iterations,
            max_speed: self.max_speed,
            boundary: self.boundary.into(),
            convergence: self.patience.map(|patience| ConvergencePolicy {
                patience,
                tolerance: self.tolerance,
            }),
            auto_tune: self.auto_tune,
            rng_seed: self.seed,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = cli.to_config();
    let mut simulation = Simulation::new(config).context("building simulation")?;
    info!(
        particles = simulation.config().particles,
        map_size = simulation.config().terrain.size,
        iterations = simulation.config().max_iterations,
        "Starting bird-swarm run",
    );

    let outcome = simulation.run().context("running simulation")?;
    info!(
        iterations = outcome.iterations,
        stop = ?outcome.stop,
        best_fitness = outcome.global_best_fitness,
        best_x = outcome.global_best_position.x,
        best_y = outcome.global_best_position.y,
        "Run finished",
    );

    write_outcome(&cli.output, &outcome)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

fn write_outcome(output: &Path, outcome: &RunOutcome) -> Result<()> {
    if output.as_os_str() == "-" {
        let stdout = io::stdout().lock();
        let mut writer = BufWriter::new(stdout);
        serde_json::to_writer(&mut writer, outcome).context("writing frames to stdout")?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    } else {
        let file = File::create(output)
            .with_context(|| format!("creating {}", output.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, outcome)
            .with_context(|| format!("writing frames to {}", output.display()))?;
        writer.flush()?;
    }
    Ok(())
}
