use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "bill-cli")]
#[command(about = "Query a billing service or the edge router", long_about = None)]
struct Cli {
    /// Base URL of the billing service or edge router.
    #[arg(short, long, env = "BILL_CLI_URL", default_value = "http://localhost:8888")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch an enriched bill
    Bill { id: u64 },
    /// List circuit breaker status (billing service only)
    Breakers,
    /// GET an arbitrary path, e.g. /customers/1
    Get { path: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let path = match cli.command {
        Commands::Bill { id } => format!("/API/bills/{id}"),
        Commands::Breakers => "/admin/breakers".to_string(),
        Commands::Get { path } if path.starts_with('/') => path,
        Commands::Get { path } => format!("/{path}"),
    };

    let res = client.get(format!("{base}{path}")).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: server returned status {status}");
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{text}"),
    }

    if status.is_success() {
        Ok(())
    } else {
        Err(format!("request failed with status {status}").into())
    }
}
