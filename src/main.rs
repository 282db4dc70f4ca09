// src/main.rs

use anyhow::Context;
use timedag::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("timedag error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;

    let input = args.input.display().to_string();
    run(args)
        .await
        .with_context(|| format!("failed to run plan '{input}'"))
}
