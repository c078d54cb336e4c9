use clap::Parser;

use ppx_bridge::init::{Config, build_tool_host};

/// Ask Perplexity one question using the stored session cookies.
#[derive(Debug, Parser)]
#[command(name = "ppx-ask", version)]
struct Args {
    /// The question to ask
    #[arg(required_unless_present = "list_models")]
    query: Option<String>,

    /// Model key (see --list-models)
    #[arg(short, long, default_value = "sonar")]
    model: String,

    /// Print the available model keys and exit
    #[arg(long)]
    list_models: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    dotenv::dotenv().ok();
    let args = Args::parse();

    let host = build_tool_host(&Config::from_env()?)?;
    if args.list_models {
        println!("{}", host.registry().describe());
        return Ok(());
    }

    let query = args.query.unwrap_or_default();
    let output = host
        .call(
            "perplexity_ask",
            serde_json::json!({ "query": query, "model": args.model }),
        )
        .await;
    if output.is_error {
        eprintln!("{}", output.as_text());
        std::process::exit(1);
    }
    println!("{}", output.as_text());
    Ok(())
}
