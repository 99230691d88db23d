use anyhow::Result;
use clap::Parser;
use moviesd::cli::Cli;

fn main() -> Result<()> {
    moviesd::run(Cli::parse())
}
