use clap::Parser;
use joblog::cli::{self, Cli};
use joblog::runtime::boot;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = boot::load_config()?;
    boot::init_logging(&config.log_filter);

    let output = cli::run(cli, &config).await?;
    if output.ends_with('\n') {
        print!("{}", output);
    } else {
        println!("{}", output);
    }
    Ok(())
}
