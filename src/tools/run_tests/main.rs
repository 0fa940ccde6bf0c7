// src/tools/run_tests/main.rs

use std::path::PathBuf;

use clap::Parser;

use cask::runner;

#[derive(Parser)]
#[command(name = "run-tests")]
#[command(about = "Run every test_* script in a directory and report one aggregate verdict", long_about = None)]
struct Cli {
    /// Directory to scan for test scripts
    #[arg(long, default_value = "tests")]
    dir: PathBuf,

    /// Extension a test script must carry
    #[arg(long, default_value = "sh")]
    ext: String,

    /// Interpreter used to execute each script
    #[arg(long, default_value = "sh")]
    interpreter: String,

    /// Execute scripts directly (needs the exec bit) instead of via the interpreter
    #[arg(long, default_value_t = false)]
    direct: bool,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging before any async code runs
    if cli.debug {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt().init();
    }

    let scripts = runner::discover(&cli.dir, &cli.ext)?;
    let interpreter = (!cli.direct).then_some(cli.interpreter.as_str());
    let report = runner::run_all(&scripts, interpreter).await;

    println!("{}", report.summary_line());
    std::process::exit(report.exit_code());
}
