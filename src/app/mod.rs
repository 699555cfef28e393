mod report;
mod runner;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::fs;
use std::time::Instant;
use tracing::info;

use square_well::config::{Args, Config, RunConfig};
use square_well::io::setup_output;

use self::report::{report_configuration, report_summary};
use self::runner::run;

pub struct SquareWellApplication {
    args: Args,
    config: Config,
}

impl SquareWellApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        let config = load_config(&args)?;
        Ok(Self { args, config })
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.output.as_deref(), self.args.verbose)
            .wrap_err("Unable to set up the log output")?;
        let started = Instant::now();

        let run_config: RunConfig = self
            .config
            .resolve(&self.args)
            .wrap_err("Invalid simulation parameters")?;
        report_configuration(&run_config);

        let outcome = run(&run_config)?;
        report_summary(&outcome);
        info!("Total time {:.1} s", started.elapsed().as_secs_f64());
        Ok(())
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let Some(path) = args.config_file.as_ref() else {
        return Ok(Config::default().with_defaults());
    };
    let config_content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", path))?;
    let config = Config::from_yaml(&config_content).wrap_err("Failed to parse configuration file")?;
    Ok(config)
}
