use clap::{Parser, Subcommand};
use serde_json::Value;

use payout_relay::chain::rpc::{LedgerRpc, RpcClient};
use payout_relay::chain::types::NodeConfig;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Diagnostics CLI for the payout relay's ledger node", long_about = None)]
struct Cli {
    /// Ledger node RPC endpoint.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the chain head
    Head,
    /// Show available resource credits for an account
    Rc { account: String },
    /// Show which blocks contain a transaction
    Status { transaction_id: String },
    /// Read-only contract call
    Read {
        contract: String,
        method: String,
        /// Call arguments as JSON
        #[arg(default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = NodeConfig {
        rpc_url: cli.url,
        ..NodeConfig::default()
    };
    let client = RpcClient::new(&config)?;

    match cli.command {
        Commands::Head => {
            let head = client.head_info().await?;
            print_json(&serde_json::to_value(&head)?)?;
        }
        Commands::Rc { account } => {
            let rc = client.account_rc(&account).await?;
            print_json(&serde_json::json!({ "account": account, "rc": rc }))?;
        }
        Commands::Status { transaction_id } => {
            let blocks = client.transaction_blocks(&transaction_id).await?;
            if blocks.is_empty() {
                print_json(&serde_json::json!({
                    "transaction_id": transaction_id,
                    "confirmed": false,
                }))?;
                return Ok(());
            }
            let heights = client.block_heights(&blocks).await?;
            let containing: Vec<Value> = blocks
                .iter()
                .zip(heights.iter())
                .map(|(id, height)| serde_json::json!({ "id": id, "height": height }))
                .collect();
            print_json(&serde_json::json!({
                "transaction_id": transaction_id,
                "confirmed": true,
                "containing_blocks": containing,
            }))?;
        }
        Commands::Read {
            contract,
            method,
            args,
        } => {
            let args: Value = serde_json::from_str(&args)?;
            let value = client.read_contract(&contract, &method, args).await?;
            print_json(&value)?;
        }
    }

    Ok(())
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
