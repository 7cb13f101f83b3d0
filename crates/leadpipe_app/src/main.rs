mod cli;
mod platform;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    platform::logging::initialize(cli.log_destination.into(), cli.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let succeeded = runtime.block_on(platform::app::run(cli.command))?;
    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
