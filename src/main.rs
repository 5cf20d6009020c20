use clap::Parser;
use qosc::{
    cli::{Args, run},
    error::QoscError,
};

#[tokio::main]
async fn main() -> Result<(), QoscError> {
    env_logger::init();

    let args = Args::parse();

    let exit_code = run(&args).await?;
    std::process::exit(exit_code);
}
