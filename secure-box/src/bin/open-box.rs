use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::*;

use secure_box::grid::parse_diagram;
use secure_box::{open_box, Dims, Lockbox, SecureBox, Strategy};

/// Shuffle a secure box and unlock it by solving its toggle system over GF(2).
#[derive(Parser, Debug)]
#[command(name = "open-box", version, about)]
struct Args {
    /// Number of rows in the box.
    #[arg(required_unless_present = "grid", requires = "cols")]
    rows: Option<usize>,

    /// Number of columns in the box.
    #[arg(required_unless_present = "grid", requires = "rows")]
    cols: Option<usize>,

    /// Seed for the shuffle (default: OS entropy).
    #[arg(long)]
    seed: Option<u64>,

    /// Start from a `#`/`.` diagram instead of a shuffled box.
    #[arg(long, value_name = "FILE", conflicts_with = "seed")]
    grid: Option<PathBuf>,

    /// How to pick toggles when several sets open the box.
    #[arg(long, value_enum, default_value_t = Strategy::Particular)]
    strategy: Strategy,

    /// Print the box before and after solving.
    #[arg(long)]
    show: bool,
}

fn build_box(args: &Args) -> Result<SecureBox> {
    if let Some(path) = &args.grid {
        let input = fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("reading {}", path.display()))?;
        let secure_box = SecureBox::from_state(parse_diagram(&input)?)?;

        if let (Some(rows), Some(cols)) = (args.rows, args.cols) {
            let expected = Dims::new(rows, cols)?;
            ensure!(
                secure_box.dims() == expected,
                "{} holds a {} grid, expected {expected}",
                path.display(),
                secure_box.dims()
            );
        }
        return Ok(secure_box);
    }

    let (Some(rows), Some(cols)) = (args.rows, args.cols) else {
        bail!("ROWS and COLS are required without --grid");
    };
    match args.seed {
        Some(seed) => SecureBox::seeded(rows, cols, seed),
        None => SecureBox::from_entropy(rows, cols),
    }
}

/// Exit code for invalid input, kept apart from a locked box.
const INVALID_INPUT: u8 = 2;

/// Solves the requested box and returns whether it is still locked.
fn run(args: &Args) -> Result<bool> {
    let mut secure_box = build_box(args)?;
    if args.show {
        println!("{secure_box}\n");
    }

    let outcome = open_box(&mut secure_box, args.strategy)?;
    tracing::debug!(
        toggles = outcome.toggles,
        rank = outcome.rank,
        free_vars = outcome.free_vars,
        "solve finished"
    );
    if args.show {
        println!("{secure_box}\n");
    }
    Ok(outcome.locked)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    match run(&args) {
        Ok(true) => {
            println!("BOX: LOCKED!");
            ExitCode::FAILURE
        }
        Ok(false) => {
            println!("BOX: OPENED!");
            ExitCode::SUCCESS
        }
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::from(INVALID_INPUT)
        }
    }
}
