mod bot;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jigsnap_core::{layout, Table, TableConfig, TableError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Parser)]
#[command(name = "jigsnap-cli", version, about = "Headless tools for jigsnap interlock tables")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone, Copy)]
struct GridArgs {
    #[arg(long, default_value_t = 4)]
    cols: usize,
    #[arg(long, default_value_t = 3)]
    rows: usize,
    #[arg(long, default_value_t = 1.0)]
    piece_width: f32,
    #[arg(long, default_value_t = 1.0)]
    piece_height: f32,
    /// Tab reach as a fraction of the piece size.
    #[arg(long, default_value_t = 0.1)]
    overlap: f32,
}

#[derive(Subcommand)]
enum Commands {
    /// Scramble a grid puzzle and let the solver bot put it back together.
    Solve {
        #[command(flatten)]
        grid: GridArgs,
        #[arg(long, env = "JIGSNAP_SEED")]
        seed: Option<String>,
        #[arg(long, env = "JIGSNAP_CONFIG")]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 10_000)]
        max_gestures: u32,
        #[arg(long)]
        shuffle_positions: bool,
        #[arg(long, default_value_t = 6)]
        drag_steps: u32,
    },
    /// Print the solved-neighbor table of every piece.
    Neighbors {
        #[command(flatten)]
        grid: GridArgs,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            grid,
            seed,
            config,
            max_gestures,
            shuffle_positions,
            drag_steps,
        } => {
            let config = match config {
                Some(path) => TableConfig::load(&path)?,
                None => TableConfig::default(),
            };
            let seed = match seed.as_deref() {
                Some(raw) => parse_seed_arg(raw)?,
                None => rand::rng().random::<u32>(),
            };
            let mut table = build_table(grid, config)?;
            bot::scramble_table(&mut table, seed, shuffle_positions)?;
            println!("seed: {seed:#010x}");
            println!("pieces: {} ({}x{})", table.len(), grid.cols, grid.rows);

            let mut rng = StdRng::seed_from_u64(u64::from(seed));
            let run = bot::BotRunConfig {
                max_gestures,
                drag_steps,
                ..bot::BotRunConfig::default()
            };
            let report = bot::run_bot(&mut table, run, &mut rng)?;
            println!(
                "taps: {} drags: {} ticks: {} groups: {} completion: {:.2}",
                report.taps,
                report.drags,
                report.ticks,
                table.group_count(),
                table.completion_ratio()
            );
            if report.complete {
                println!("solved");
            } else {
                println!("gave up after {max_gestures} gestures");
            }
        }
        Commands::Neighbors { grid } => {
            let table = build_table(grid, TableConfig::default())?;
            for piece in table.pieces() {
                let neighbors = piece
                    .solution_poses()
                    .iter()
                    .map(|pose| {
                        format!(
                            "{} at ({:.2}, {:.2})",
                            pose.neighbor, pose.local_offset.0, pose.local_offset.1
                        )
                    })
                    .collect::<Vec<_>>();
                println!("{}: {}", piece.id(), neighbors.join(", "));
            }
        }
    }

    Ok(())
}

fn build_table(grid: GridArgs, config: TableConfig) -> Result<Table, TableError> {
    let specs = layout::grid(
        grid.cols,
        grid.rows,
        grid.piece_width,
        grid.piece_height,
        grid.overlap,
    );
    let mut table = Table::new(config, &specs)?;
    table.init_neighborhoods();
    Ok(table)
}

fn parse_seed_arg(raw: &str) -> Result<u32, Box<dyn Error>> {
    let trimmed = raw.trim();
    let value = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16)?
    } else {
        trimmed.parse::<u32>()?
    };
    Ok(value)
}
