//! Square-well Monte Carlo command-line interface

mod app;

use app::SquareWellApplication;
use color_eyre::eyre::Result;

fn main() -> Result<()> {
    color_eyre::install()?;
    SquareWellApplication::from_cli()?.run()
}
