use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use panen_common::Rupiah;
use tripay_tools::{
    signature::{callback_signature, transaction_signature, transaction_signature_data},
    TripayConfig,
    CALLBACK_SIGNATURE_HEADER,
};

#[derive(Debug, Subcommand)]
pub enum SignCommand {
    /// The signature sent with a new transaction request.
    Transaction {
        /// e.g. GB-42
        #[arg(short, long = "merchant-ref")]
        merchant_ref: String,
        /// The transaction amount, in whole rupiah
        #[arg(short, long)]
        amount: i64,
    },
    /// The `X-Callback-Signature` header for a callback body. The file is signed byte for byte, so mind the
    /// trailing newline.
    Callback {
        #[arg(short, long)]
        file: PathBuf,
    },
}

pub async fn handle_sign_command(command: SignCommand) -> Result<()> {
    let config = TripayConfig::new_from_env_or_default();
    anyhow::ensure!(config.private_key.is_set(), "TRIPAY_PRIVATE_KEY must be set to compute signatures");
    match command {
        SignCommand::Transaction { merchant_ref, amount } => {
            let amount = Rupiah::from(amount);
            let data = transaction_signature_data(&config.merchant_code, &merchant_ref, amount);
            let signature = transaction_signature(&config.private_key, &config.merchant_code, &merchant_ref, amount)?;
            println!("Signed data: {data}");
            println!("signature: {signature}");
        },
        SignCommand::Callback { file } => {
            let body = tokio::fs::read(&file).await.with_context(|| format!("Could not read {}", file.display()))?;
            let signature = callback_signature(&config.private_key, &body)?;
            println!("{CALLBACK_SIGNATURE_HEADER}: {signature}");
        },
    }
    Ok(())
}
