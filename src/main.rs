use clap::Parser;
use modulation_toolbox::cli::{Args, Run};
use std::error::Error;

#[termination::display]
fn main() -> Result<(), Box<dyn Error>> {
    Args::parse().run()
}
