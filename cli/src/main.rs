mod notifier;
mod repl;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use payhub_core::commands::Command;
use payhub_core::{
    Chain, Eip1193Provider, HttpProvider, LogNotifier, Notifier, PaymentSubmitter, SessionConfig,
    SessionManager,
};
use tracing_subscriber::EnvFilter;

use crate::notifier::TerminalNotifier;

/// How often the node is polled for chain/account changes.
const WATCH_INTERVAL: Duration = Duration::from_secs(4);

#[derive(Parser)]
#[command(name = "payhub", about = "PayHub: send ETH from a connected wallet", version)]
pub(crate) struct Cli {
    /// Target network: mainnet, sepolia or holesky
    #[arg(long, env = "PAYHUB_NETWORK", default_value = "sepolia")]
    network: Chain,

    /// JSON-RPC endpoint of the wallet node. Without it no wallet provider is available.
    #[arg(long, env = "PAYHUB_NODE")]
    node: Option<String>,

    /// Allow connecting to non-HTTPS node URLs
    #[arg(long)]
    insecure: bool,

    /// Seconds between background balance refreshes while connected
    #[arg(long, default_value_t = 30)]
    poll_interval: u64,

    /// Seconds to wait for a payment to confirm before giving up (0 waits indefinitely)
    #[arg(long, default_value_t = 600)]
    receipt_timeout: u64,

    /// Run a single command and exit
    #[arg(long)]
    cmd: Option<String>,

    /// Output in JSON format (useful with --cmd)
    #[arg(long)]
    json: bool,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Cli {
    fn session_config(&self) -> Result<SessionConfig> {
        if self.poll_interval == 0 {
            bail!("--poll-interval must be at least 1 second.");
        }
        Ok(SessionConfig {
            target: self.network,
            balance_poll_interval: Duration::from_secs(self.poll_interval),
            receipt_timeout: (self.receipt_timeout > 0)
                .then(|| Duration::from_secs(self.receipt_timeout)),
            ..SessionConfig::default()
        })
    }

    /// Build the provider for `--node`, watching it for chain/account changes.
    fn provider(&self) -> Result<Option<Arc<dyn Eip1193Provider>>> {
        let Some(url) = &self.node else {
            tracing::warn!("no --node given, running without a wallet provider");
            return Ok(None);
        };
        let provider = Arc::new(HttpProvider::new(url, self.insecure)?);
        provider.watch(WATCH_INTERVAL);
        Ok(Some(provider as Arc<dyn Eip1193Provider>))
    }

    fn notifier(&self) -> Arc<dyn Notifier> {
        if self.json {
            Arc::new(LogNotifier)
        } else {
            Arc::new(TerminalNotifier::default())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let session = SessionManager::new(cli.provider()?, cli.session_config()?);
    session.listen();
    let payments = PaymentSubmitter::new(session.clone(), cli.notifier());

    let result = if let Some(cmd_str) = &cli.cmd {
        // One-shot mode
        run_oneshot(&cli, &session, &payments, cmd_str).await
    } else {
        // REPL mode
        repl::run_repl(&cli, &session, &payments).await
    };

    session.shutdown();
    result
}

async fn run_oneshot(
    cli: &Cli,
    session: &Arc<SessionManager>,
    payments: &PaymentSubmitter,
    cmd_str: &str,
) -> Result<()> {
    let command = Command::parse(cmd_str)?;
    if command == Command::Exit {
        return Ok(());
    }

    if command.needs_connection() {
        session.connect().await?;
    }

    if let Some(prompt_msg) = command.confirmation_prompt() {
        if !cli.yes && !repl::prompt_confirm(&prompt_msg) {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let output = command.execute(session, payments, cli.json).await?;
    if !output.is_empty() {
        println!("{output}");
    }

    Ok(())
}
