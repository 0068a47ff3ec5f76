//! Sign a Celo fee-currency transaction
//!
//! Run with: cargo run --example sign_cip64
//!
//! Uses Privy when PRIVY_APP_ID, PRIVY_APP_SECRET, PRIVY_WALLET_ID and
//! PRIVY_WALLET_ADDRESS are set, otherwise a throwaway local key.

use alloy::primitives::{address, U256};
use custody_signer::{
    ChainAccount, Cip64Transaction, LocalSigner, PrivyClient, PrivyConfig, RemoteSigner,
    RemoteSigningAccount, UnsignedTx,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    // cUSD on Celo mainnet
    let tx = UnsignedTx::new(address!("1111111111111111111111111111111111111111"))
        .with_chain_id(42220)
        .with_nonce(0)
        .with_gas_limit(100_000)
        .with_fees(30_000_000_000, 1_000_000_000)
        .with_value(U256::from(1_000_000_000_000_000u64))
        .with_fee_currency(address!("765DE816845861e75A25fCA122bb6898B8B1282a"));

    match (
        std::env::var("PRIVY_WALLET_ID"),
        std::env::var("PRIVY_WALLET_ADDRESS"),
    ) {
        (Ok(wallet_id), Ok(address)) => {
            let client = Arc::new(PrivyClient::new(PrivyConfig::from_env()?)?);
            let account = RemoteSigningAccount::connect(client, wallet_id, address.parse()?).await?;
            sign_and_print(&account, tx).await
        }
        _ => {
            let signer = Arc::new(LocalSigner::random("local"));
            println!("No Privy wallet configured, using local key {}", signer.address());
            let account = RemoteSigningAccount::new(Arc::clone(&signer), "local", signer.address());
            sign_and_print(&account, tx).await
        }
    }
}

async fn sign_and_print<C: RemoteSigner>(
    account: &RemoteSigningAccount<C>,
    tx: UnsignedTx,
) -> eyre::Result<()> {
    let raw = account.sign_transaction(tx).await?;
    let sender = Cip64Transaction::recover_signer(&raw)?;

    println!("Signed CIP-64 transaction: {}", alloy::hex::encode_prefixed(&raw));
    println!("Recovered sender: {} (account {})", sender, account.address());
    Ok(())
}
