use std::sync::Arc;

use anyhow::{bail, Result};

use super::help::help_text;
use super::Command;
use crate::chain::explorer_tx_url;
use crate::display;
use crate::payment::PaymentSubmitter;
use crate::session::SessionManager;

impl Command {
    /// Execute a command and return the output string.
    pub async fn execute(
        &self,
        session: &Arc<SessionManager>,
        payments: &PaymentSubmitter,
        json_output: bool,
    ) -> Result<String> {
        match self {
            Command::Connect => {
                session.connect().await?;
                let snapshot = session.snapshot();
                if json_output {
                    Ok(display::format_session_json(&snapshot))
                } else {
                    Ok(display::format_session(&snapshot))
                }
            }

            Command::Disconnect => {
                session.disconnect();
                if json_output {
                    Ok(display::format_session_json(&session.snapshot()))
                } else {
                    Ok("Disconnected.".to_string())
                }
            }

            Command::Balance => {
                if !session.snapshot().is_connected() {
                    bail!("Wallet not connected. Run 'connect' first.");
                }
                // A failed refresh keeps the last known balance.
                let wei = match session.refresh_balance().await {
                    Some(wei) => wei,
                    None => match session.snapshot().balance {
                        Some(wei) => wei,
                        None => bail!("Failed to fetch balance."),
                    },
                };
                if json_output {
                    Ok(display::format_balance_json(wei))
                } else {
                    Ok(display::format_balance(wei))
                }
            }

            Command::Address => {
                let Some(account) = session.snapshot().account else {
                    bail!("Wallet not connected. Run 'connect' first.");
                };
                if json_output {
                    Ok(serde_json::json!({ "address": account.to_string() }).to_string())
                } else {
                    Ok(account.to_string())
                }
            }

            Command::Status => {
                let snapshot = session.snapshot();
                if json_output {
                    Ok(display::format_session_json(&snapshot))
                } else {
                    Ok(display::format_session(&snapshot))
                }
            }

            Command::Send { recipient, amount } => {
                let hash = payments.submit(recipient, amount).await?;
                let chain_id = session
                    .snapshot()
                    .network
                    .map(|n| n.chain_id)
                    .unwrap_or_else(|| session.config().target.chain_id());
                let link = explorer_tx_url(chain_id, &hash.to_string());
                if json_output {
                    Ok(serde_json::json!({
                        "hash": hash.to_string(),
                        "status": "succeeded",
                        "amount": amount.trim(),
                        "recipient": recipient.trim(),
                        "explorer": link,
                    })
                    .to_string())
                } else {
                    Ok(format!(
                        "Payment confirmed!\n  Hash:     {hash}\n  Amount:   {} ETH -> {}\n  Explorer: {link}",
                        amount.trim(),
                        recipient.trim(),
                    ))
                }
            }

            Command::Help { command } => Ok(help_text(command.as_deref())),

            Command::Exit => Ok(String::new()),
        }
    }
}
