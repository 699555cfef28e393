//! Command-line arguments

use clap::Parser;

/// Square-well fluid Monte Carlo with adaptive energy weights
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    pub config_file: Option<String>,

    /// Log file (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Number of balls
    #[arg(long = "N")]
    pub n: Option<usize>,

    /// Ball radius
    #[arg(long = "R")]
    pub radius: Option<f64>,

    /// Ratio of square well width to ball diameter
    #[arg(long)]
    pub ww: Option<f64>,

    /// Filling fraction; sizes the cell unless lengths are given
    #[arg(long)]
    pub ff: Option<f64>,

    /// Cell lengths
    #[arg(long, num_args = 3, value_names = ["LX", "LY", "LZ"])]
    pub lengths: Option<Vec<f64>>,

    /// Number of walled dimensions, starting from x
    #[arg(long)]
    pub walls: Option<usize>,

    /// Production sweeps
    #[arg(long)]
    pub iterations: Option<u64>,

    /// Sweeps of the walker initialization phase
    #[arg(long)]
    pub init_iters: Option<u64>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Neighbor sphere radius in units of R times ww
    #[arg(long)]
    pub neighbor_scale: Option<f64>,

    /// Initial translation step in units of R
    #[arg(long)]
    pub translation_scale: Option<f64>,

    /// Neighbor table margin in units of R
    #[arg(long)]
    pub dr: Option<f64>,

    /// Goal for the acceptance rate
    #[arg(long)]
    pub acceptance_goal: Option<f64>,

    /// Radial bin width of the pair distribution
    #[arg(long)]
    pub de_g: Option<f64>,

    /// Largest radius of the pair distribution
    #[arg(long)]
    pub max_rdf_radius: Option<f64>,

    /// Slab width of the density profile
    #[arg(long)]
    pub de_density: Option<f64>,

    /// Directory for the data files
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Base name of the data files
    #[arg(long)]
    pub filename: Option<String>,

    /// Suffix appended to the base name
    #[arg(long)]
    pub filename_suffix: Option<String>,

    /// Sweeps between progress reports
    #[arg(long)]
    pub time: Option<u64>,

    /// Check interactions and neighbor tables after every sweep (slow)
    #[arg(long)]
    pub debug: bool,

    /// Log debug messages
    #[arg(short, long)]
    pub verbose: bool,

    /// Unweighted sampling
    #[arg(long)]
    pub nw: bool,

    /// Canonical sampling at this temperature
    #[arg(long = "kT")]
    pub kt: Option<f64>,

    /// Flat histogram from a Gaussian fit refined by repeated passes
    #[arg(long)]
    pub flat: bool,

    /// Weights from a single Gaussian fit
    #[arg(long)]
    pub gaussian: bool,

    /// Walker optimization
    #[arg(long)]
    pub walkers: bool,

    /// Wang-Landau
    #[arg(long)]
    pub wang_landau: bool,

    /// Initial Wang-Landau factor
    #[arg(long)]
    pub wl_factor: Option<f64>,

    /// Divisor applied to the Wang-Landau factor
    #[arg(long)]
    pub wl_fmod: Option<f64>,

    /// Histogram flatness threshold for Wang-Landau
    #[arg(long)]
    pub wl_threshold: Option<f64>,

    /// Wang-Landau factor at which adaptation stops
    #[arg(long)]
    pub wl_cutoff: Option<f64>,

    /// Ratio of histogram width to energy range for the flat method
    #[arg(long)]
    pub gaussian_cutoff: Option<f64>,

    /// Sweeps before the first walker update
    #[arg(long)]
    pub first_update: Option<u64>,
}
