use clap::Parser;
use shredscan::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = cli.run().await;
    std::process::exit(code);
}
