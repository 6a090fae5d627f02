use clap::Parser;
use nexus::commands::smoke::{handle_smoke, SmokeArgs};
use nexus::common::{init_logging, GlobalOpts};

#[derive(Parser)]
#[command(
    name = "nexus-smoke",
    about = "Check that a write to the shared vector store is readable",
    long_about = "Reads the store path from NEXUS_VECTOR_DB and the collection from \
                  NEXUS_COLLECTION, writes one probe document and reads it back. \
                  Exits 0 when visible, 2 when not, 1 when the check cannot run.",
    version
)]
struct Cli {
    #[command(flatten)]
    args: SmokeArgs,

    #[command(flatten)]
    global: GlobalOpts,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.global);
    std::process::exit(handle_smoke(&cli.args));
}
