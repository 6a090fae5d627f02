use clap::Parser;
use nexus::commands::prompt::{handle_prompt, PromptArgs};
use nexus::common::{init_logging, GlobalOpts};

#[derive(Parser)]
#[command(
    name = "nexus-context-prompt",
    about = "Build a context prompt with the Deep-Sea Nexus plugin",
    version
)]
struct Cli {
    #[command(flatten)]
    args: PromptArgs,

    #[command(flatten)]
    global: GlobalOpts,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.global);
    std::process::exit(handle_prompt(&cli.args));
}
