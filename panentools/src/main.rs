use clap::{Parser, Subcommand};

mod formatting;
mod setup;
mod sign;

use setup::{handle_setup_command, SetupCommand};
use sign::{handle_sign_command, SignCommand};

#[derive(Parser, Debug)]
#[command(version = "0.1.0", about = "Operator tools for the PanenHub group-buy server")]
pub struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Prepare a local database. These commands read `PANEN_DATABASE_URL`.
    #[command(subcommand)]
    Setup(SetupCommand),
    /// Print the signatures Tripay would compute, for testing callbacks by hand. These commands read
    /// `TRIPAY_PRIVATE_KEY` and `TRIPAY_MERCHANT_CODE`.
    #[command(subcommand)]
    Sign(SignCommand),
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    env_logger::init();
    let cli = Arguments::parse();
    let result = match cli.command {
        Command::Setup(command) => handle_setup_command(command).await,
        Command::Sign(command) => handle_sign_command(command).await,
    };
    if let Err(e) = result {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
