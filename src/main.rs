use clap::Parser;
use relay::cli::{handle_classify, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => relay::cli::serve::run_serve(args).await,
        Commands::Classify(args) => {
            println!("{}", handle_classify(&args));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
