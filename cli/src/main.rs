use clap::{Parser, Subcommand};
use finmock_core::Tool;

mod commands;
mod util;

use util::exit_error;

#[derive(Parser)]
#[command(
    name = "finmock",
    version,
    about = "finmock CLI: drive the mock financial-data server from a terminal"
)]
struct Cli {
    /// Server base URL
    #[arg(long, env = "FINMOCK_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health
    Health,
    /// List the tools the server exposes
    Tools,
    /// Call a tool on an existing session
    Call {
        /// Session id sent as Mcp-Session-Id
        #[arg(long, env = "FINMOCK_SESSION_ID")]
        session_id: String,
        /// Tool name (e.g. "fetch_net_worth")
        #[arg(long)]
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(long)]
        arguments: Option<String>,
    },
    /// Log a session in as a phone number
    Login {
        #[arg(long, env = "FINMOCK_SESSION_ID")]
        session_id: String,
        /// Phone number with provisioned test data
        #[arg(long)]
        phone: String,
    },
    /// Run call, login and call again on a fresh session
    Connect {
        #[arg(long)]
        phone: String,
        #[arg(long, default_value = "fetch_net_worth")]
        tool: Tool,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = finmock_mcp_runtime::parse_base_url(&cli.url) {
        exit_error(
            &format!("Invalid --url '{}': {e}", cli.url),
            Some("Use an absolute http(s) URL, e.g. http://localhost:8080"),
        );
    }

    let code = match cli.command {
        Commands::Health => commands::health::run(&cli.url).await,
        Commands::Tools => commands::tools::list(&cli.url).await,
        Commands::Call {
            session_id,
            tool,
            arguments,
        } => commands::tools::call(&cli.url, &session_id, &tool, arguments.as_deref()).await,
        Commands::Login { session_id, phone } => {
            commands::login::run(&cli.url, &session_id, &phone).await
        }
        Commands::Connect { phone, tool } => commands::connect::run(&cli.url, &phone, tool).await,
    };

    std::process::exit(code);
}
