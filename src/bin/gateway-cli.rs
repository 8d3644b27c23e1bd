use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the Failover Gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// List backend health and circuit state
    Backends,
    /// Show response cache size
    Cache,
    /// Drop every cached response
    ClearCache,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{base}/admin/status")).send().await?;
            print_response(res).await?;
        }
        Commands::Backends => {
            let res = client.get(format!("{base}/admin/backends")).send().await?;
            print_response(res).await?;
        }
        Commands::Cache => {
            let res = client.get(format!("{base}/admin/cache")).send().await?;
            print_response(res).await?;
        }
        Commands::ClearCache => {
            let res = client.delete(format!("{base}/admin/cache")).send().await?;
            if res.status().is_success() {
                println!("Cache cleared");
            } else {
                eprintln!("Error: Admin API returned status {}", res.status());
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {status}");
        if let Ok(text) = res.text().await {
            eprintln!("Response: {text}");
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
