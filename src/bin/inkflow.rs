//! InkFlow Studio CLI
//!
//! Command-line front end for the studio tools and the design service.

#[cfg(feature = "cli")]
use inkflow_studio::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(1);
}
