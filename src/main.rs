use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

use contactlook::{export, pdb, tui, DistanceMatrix, PairDistance, Result};

#[derive(Parser)]
#[command(name = "contactlook")]
#[command(about = "Display the contact map of a protein chain in the terminal.", long_about = None)]
#[command(version)]
struct Args {
    // MANDATORY OPTIONS
    /// Read alpha-carbon coordinates from this PDB FILE.
    #[arg(value_name = "FILE")]
    input: PathBuf,

    // Contact Options
    /// Chain to read from the input file (default: first chain in SEQRES).
    #[arg(short = 'c', long = "chain", value_name = "CHAR")]
    chain: Option<char>,

    /// Distance threshold for a contact, in Angstroms.
    #[arg(short = 't', long = "threshold", value_name = "FLOAT", default_value_t = 8.0)]
    threshold: f64,

    // Export Options
    /// Save the list of contacts to this FILE.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Save an EPS diagram of the contact map to this FILE.
    #[arg(short = 'e', long = "eps", value_name = "FILE")]
    eps: Option<PathBuf>,

    /// Save an image of the contact map to this FILE (PNG or SVG based on extension).
    #[arg(short = 'i', long = "image", value_name = "FILE")]
    image: Option<PathBuf>,

    /// Pixels per residue in PNG images.
    #[arg(short = 'p', long = "pixels-per-residue", value_name = "N", default_value_t = 4)]
    pixels_per_residue: u32,

    // Viewer Options
    /// Don't open the interactive viewer; only write the requested files.
    #[arg(short = 'n', long = "no-view")]
    no_view: bool,

    /// Draw without colours.
    #[arg(long = "no-color")]
    no_color: bool,

    // Threading
    /// Number of threads to use for computing distances.
    #[arg(short = 'j', long = "threads", value_name = "N")]
    threads: Option<usize>,

    // Logging
    /// Verbosity level (0 = error, 1 = info, 2 = debug).
    #[arg(short = 'v', long = "verbose", value_name = "N", default_value_t = 1)]
    verbose: u8,
}

fn run(args: &Args) -> Result<()> {
    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
            debug!("Keeping default thread pool: {}", e);
        }
    }

    let table = pdb::read_coordinates(&args.input, args.chain)?;
    let dm = DistanceMatrix::build(&table)?;
    drop(table);
    info!("Built distance matrix for {} residues", dm.len());

    let threshold = args.threshold.max(0.0);

    if let Some(ref path) = args.output {
        export::save_contacts(path, &dm, threshold)?;
    }
    if let Some(ref path) = args.eps {
        export::save_eps(path, &dm, threshold)?;
    }
    if let Some(ref path) = args.image {
        export::save_image(path, &dm, threshold, args.pixels_per_residue)?;
    }

    if args.no_view {
        return Ok(());
    }

    let final_threshold = tui::run(&dm, threshold, tui::Palette::new(!args.no_color))?;
    debug!("Viewer closed at threshold {:.2}", final_threshold);
    Ok(())
}

fn main() {
    let args = Args::parse();

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    if let Err(e) = run(&args) {
        eprintln!("FATAL: {}", e);
        std::process::exit(1);
    }
}
