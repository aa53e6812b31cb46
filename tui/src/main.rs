use clap::Parser;
use richinput_tui::Cli;
use richinput_tui::run_main;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();
    run_main(cli).await
}
