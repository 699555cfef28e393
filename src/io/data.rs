use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::SimError;
use crate::histograms::{HistogramParams, Histograms, Spatial};
use crate::simulation::Simulation;
use crate::weights::WeightStrategy;

/// Name describing the run, e.g. `periodic-ww1.30-ff0.30-N100-walkers`
pub fn default_filename(walls: usize, well_width: f64, filling_fraction: f64, n: usize, tag: &str) -> String {
    let wall_tag = match walls {
        0 => "periodic",
        1 => "wall",
        2 => "tube",
        _ => "box",
    };
    format!(
        "{}-ww{:04.2}-ff{:04.2}-N{}-{}",
        wall_tag, well_width, filling_fraction, n, tag
    )
}

pub fn with_suffix(filename: String, suffix: Option<&str>) -> String {
    match suffix {
        Some(s) if !s.is_empty() => format!("{}-{}", filename, s),
        _ => filename,
    }
}

/// The set of data files of one run, all named `{dir}/{filename}-{kind}.dat`
#[derive(Debug, Clone)]
pub struct DataFiles {
    dir: PathBuf,
    filename: String,
    histogram_params: HistogramParams,
}

impl DataFiles {
    /// Creates `dir` if needed
    pub fn new(
        dir: impl Into<PathBuf>,
        filename: impl Into<String>,
        histogram_params: HistogramParams,
    ) -> Result<Self, SimError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| SimError::io(&dir, e))?;
        Ok(DataFiles {
            dir,
            filename: filename.into(),
            histogram_params,
        })
    }

    pub fn path(&self, kind: &str) -> PathBuf {
        self.dir.join(format!("{}-{}.dat", self.filename, kind))
    }

    fn header(&self, sim: &Simulation) -> String {
        let l = &sim.cell.lengths;
        let p = &sim.params;
        format!(
            "# cell dimensions: ({}, {}, {})\n\
             # walls: {}\n\
             # de_density: {}\n\
             # de_g: {}\n\
             # seed: {}\n\
             # N: {}\n\
             # R: {:.6}\n\
             # well_width: {}\n\
             # translation_distance: {}\n\
             # neighbor_scale: {}\n\
             # dr: {}\n\
             # energy_levels: {}\n\n",
            l.x,
            l.y,
            l.z,
            sim.cell.walls,
            self.histogram_params.de_density,
            self.histogram_params.de_g,
            p.seed,
            sim.n(),
            p.radius,
            p.well_width,
            sim.translation_distance,
            p.neighbor_scale,
            sim.dr,
            sim.energy_levels
        )
    }

    fn counts(sim: &Simulation) -> String {
        format!(
            "# iterations: {}\n\
             # working moves: {}\n\
             # total moves: {}\n\
             # acceptance rate: {}\n\n",
            sim.iteration,
            sim.moves.working,
            sim.moves.total,
            sim.moves.acceptance_rate()
        )
    }

    fn write_file(
        &self,
        kind: &str,
        sim: &Simulation,
        body: impl FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
    ) -> Result<(), SimError> {
        let path = self.path(kind);
        let file = File::create(&path).map_err(|e| SimError::io(&path, e))?;
        let mut out = BufWriter::new(file);
        write_all(&mut out, &self.header(sim), &Self::counts(sim), body).map_err(|e| SimError::io(&path, e))
    }

    /// Write the log weights table
    pub fn write_weights<W: WeightStrategy + ?Sized>(&self, sim: &Simulation, weights: &W) -> Result<(), SimError> {
        self.write_file("lnw", sim, |out| {
            writeln!(out, "# interactions\tln(weight)")?;
            for (e, w) in weights.ln_weights().iter().enumerate() {
                writeln!(out, "{}  {}", e, w)?;
            }
            Ok(())
        })
    }

    /// Write the energy histogram, round trip counts and the spatial
    /// histogram
    pub fn write_checkpoint(&self, sim: &Simulation, histograms: &Histograms) -> Result<(), SimError> {
        self.write_file("E", sim, |out| {
            writeln!(out, "# interactions   counts")?;
            for (e, &count) in histograms.energy.iter().enumerate() {
                if count != 0 {
                    writeln!(out, "{}  {}", e, count)?;
                }
            }
            Ok(())
        })?;

        self.write_file("rt", sim, |out| {
            writeln!(out, "# interactions\tround trips")?;
            for (e, trips) in sim.levels.round_trips.iter().enumerate() {
                writeln!(out, "{}  {}", e, trips)?;
            }
            Ok(())
        })?;

        match histograms.spatial {
            Spatial::Rdf { .. } => self.write_file("g", sim, |out| {
                write!(out, "{}", rdf_table(sim, histograms))
            }),
            Spatial::Density { .. } => self.write_file("density", sim, |out| {
                write!(out, "{}", density_table(sim, histograms))
            }),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn write_all<W: Write>(
    out: &mut W,
    header: &str,
    counts: &str,
    body: impl FnOnce(&mut W) -> std::io::Result<()>,
) -> std::io::Result<()> {
    out.write_all(header.as_bytes())?;
    out.write_all(counts.as_bytes())?;
    body(out)?;
    out.flush()
}

fn rdf_table(sim: &Simulation, histograms: &Histograms) -> String {
    let mut table = String::from(
        "# data table containing values of g (i.e. radial distribution function)\n\
         # first column reserved for specifying energy level\n\
         # column number r_n (starting from the second column, counting from zero) \
         corresponds to radius r given by r = (r_n + 0.5) * de_g\n",
    );
    for e in 0..sim.energy_levels {
        if let Some(g) = histograms.pair_distribution(e, sim.n(), sim.cell.volume()) {
            let _ = write!(table, "\n{}", e);
            for value in g {
                let _ = write!(table, " {:8.5}", value);
            }
        }
    }
    table
}

fn density_table(sim: &Simulation, histograms: &Histograms) -> String {
    let mut table = String::from(
        "# data table containing densities in slabs (bins) of thickness de_density away from a wall\n\
         # row number corresponds to energy level\n\
         # column number dn (counting from zero) corresponds to distance d from wall \
         given by d = (dn + 0.5) * de_density\n",
    );
    let cross_section = sim.cell.lengths.y * sim.cell.lengths.z;
    let bins = match &histograms.spatial {
        Spatial::Density { counts, .. } => counts.first().map_or(0, Vec::len),
        Spatial::Rdf { .. } => 0,
    };
    for e in 0..sim.energy_levels {
        table.push('\n');
        let row = histograms
            .density_profile(e, cross_section)
            .unwrap_or_else(|| vec![0.0; bins]);
        for value in row {
            let _ = write!(table, "{:8.5} ", value);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::SimParams;
    use crate::weights::{Canonical, Unweighted};

    fn small(walls: usize) -> Simulation {
        let params = SimParams {
            n: 4,
            lengths: [10.0, 10.0, 10.0],
            walls,
            seed: 5,
            ..SimParams::default()
        };
        Simulation::new(&params).unwrap()
    }

    #[test]
    fn test_default_filename() {
        assert_eq!(
            default_filename(0, 1.3, 0.3, 100, "walkers"),
            "periodic-ww1.30-ff0.30-N100-walkers"
        );
        assert_eq!(
            default_filename(2, 1.5, 0.123, 20, "kT0.5"),
            "tube-ww1.50-ff0.12-N20-kT0.5"
        );
        assert_eq!(
            with_suffix("box-ww1.30-ff0.10-N4-nw".to_string(), Some("run2")),
            "box-ww1.30-ff0.10-N4-nw-run2"
        );
        assert_eq!(with_suffix("wall".to_string(), None), "wall");
    }

    #[test]
    fn test_files_for_periodic_cell() {
        let dir = std::env::temp_dir().join("square_well_test_periodic_files");
        let _ = fs::remove_dir_all(&dir);
        let mut sim = small(0);
        let mut weights = Unweighted::new(sim.energy_levels);
        let params = HistogramParams::default();
        let mut histograms = Histograms::new(&sim, &params).unwrap();
        for _ in 0..10 {
            sim.sweep(&mut weights).unwrap();
            histograms.record(&sim);
        }

        let files = DataFiles::new(&dir, "run", params).unwrap();
        files.write_weights(&sim, &weights).unwrap();
        files.write_checkpoint(&sim, &histograms).unwrap();

        let energy = fs::read_to_string(files.path("E")).unwrap();
        assert!(energy.starts_with("# cell dimensions: (10, 10, 10)\n# walls: 0\n"));
        assert!(energy.contains("# N: 4\n"));
        assert!(energy.contains("# iterations: 10\n# working moves: "));
        let total: u64 = energy
            .lines()
            .filter(|l| !l.starts_with('#') && !l.is_empty())
            .map(|l| l.split_whitespace().nth(1).unwrap().parse::<u64>().unwrap())
            .sum();
        assert_eq!(total, 10);

        let lnw = fs::read_to_string(files.path("lnw")).unwrap();
        let rows = lnw.lines().filter(|l| !l.starts_with('#') && !l.is_empty()).count();
        assert_eq!(rows, sim.energy_levels);

        assert!(files.path("rt").exists());
        assert!(files.path("g").exists());
        assert!(!files.path("density").exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_files_for_walled_cell() {
        let dir = std::env::temp_dir().join("square_well_test_walled_files");
        let _ = fs::remove_dir_all(&dir);
        let mut sim = small(1);
        let mut weights = Canonical::new(sim.energy_levels, 1.0);
        let params = HistogramParams::default();
        let mut histograms = Histograms::new(&sim, &params).unwrap();
        sim.sweep(&mut weights).unwrap();
        histograms.record(&sim);

        let files = DataFiles::new(&dir, "walled", params).unwrap();
        files.write_checkpoint(&sim, &histograms).unwrap();
        let density = fs::read_to_string(files.path("density")).unwrap();
        let rows = density.lines().filter(|l| !l.starts_with('#') && !l.is_empty()).count();
        assert_eq!(rows, sim.energy_levels);
        assert!(!files.path("g").exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unwritable_directory_is_reported() {
        let blocker = std::env::temp_dir().join("square_well_test_blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let err = DataFiles::new(blocker.join("data"), "run", HistogramParams::default()).unwrap_err();
        assert!(matches!(err, SimError::Io { .. }));
        fs::remove_file(&blocker).unwrap();
    }
}
