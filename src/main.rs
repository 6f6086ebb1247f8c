use clap::Parser;
use epaywatch::adapter::inbound::cli::{self, command::Cli};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    if let Err(e) = cli::dispatch(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
