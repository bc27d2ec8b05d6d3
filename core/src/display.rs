//! Output formatting: ether denomination conversion and display helpers.
//!
//! Ether uses 18 decimal places (wei). 1 ETH = 10^18 wei.
use alloy_primitives::utils::{format_ether, parse_ether};
use alloy_primitives::{Address, U256};

use crate::session::{ConnectionState, Session};

const ETH_DECIMALS: usize = 18;

/// Convert wei to a decimal ether string with trailing zeros trimmed.
/// Examples: 1_500_000_000_000_000_000 -> "1.5", 0 -> "0.0"
#[must_use]
pub fn wei_to_ether(wei: U256) -> String {
    let full = format_ether(wei);
    let trimmed = full.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

/// Format a balance for display.
#[must_use]
pub fn format_balance(wei: U256) -> String {
    format!("{} ETH", wei_to_ether(wei))
}

/// Parse a human-readable ether amount into wei.
/// Accepts: "1.5", "1", "0.01", ".5". Zero parses successfully; callers decide
/// whether zero is acceptable.
#[must_use = "parsing result should be checked"]
pub fn parse_ether_amount(input: &str) -> Result<U256, String> {
    let input = input.trim();

    if input.is_empty() {
        return Err("Amount cannot be empty".to_string());
    }

    if input.starts_with('-') {
        return Err("Amount must be positive".to_string());
    }

    let (whole, frac) = input.split_once('.').unwrap_or((input, ""));
    if frac.contains('.') {
        return Err("Invalid amount format. Use ETH units like '1.5' or '0.01'.".to_string());
    }
    if whole.is_empty() && frac.is_empty() {
        return Err(format!("Invalid amount: '{input}'"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("Invalid whole part: '{whole}'"));
    }
    if !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("Invalid fractional part: '{frac}'"));
    }
    // parse_ether would silently truncate the extra digits.
    if frac.len() > ETH_DECIMALS {
        return Err("Too many decimal places. ETH supports up to 18.".to_string());
    }

    // Shape is checked above, so the only remaining failure is overflow.
    parse_ether(input).map_err(|_| "Amount too large".to_string())
}

/// `0x1234...abcd` style abbreviation for prompts and headers.
#[must_use]
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Multi-line human-readable session summary.
#[must_use]
pub fn format_session(session: &Session) -> String {
    let mut lines = vec![format!("State:   {}", session.state)];
    if let Some(account) = &session.account {
        lines.push(format!("Account: {account}"));
    }
    if let Some(network) = &session.network {
        lines.push(format!(
            "Network: {} (chain id {})",
            network.name, network.chain_id
        ));
    }
    match (&session.state, session.balance) {
        (ConnectionState::Connected, Some(b)) => lines.push(format!("Balance: {}", format_balance(b))),
        (ConnectionState::Connected, None) => lines.push("Balance: loading...".to_string()),
        _ => {}
    }
    if let Some(err) = &session.error {
        lines.push(format!("Error:   {err}"));
    }
    lines.join("\n")
}

#[must_use]
pub fn format_session_json(session: &Session) -> String {
    serde_json::json!({
        "state": session.state.to_string(),
        "connected": session.is_connected(),
        "account": session.account.map(|a| a.to_string()),
        "network": session.network.as_ref().map(|n| serde_json::json!({
            "name": n.name,
            "chain_id": n.chain_id,
        })),
        "balance": session.balance_ether(),
        "error": session.error,
    })
    .to_string()
}

#[must_use]
pub fn format_balance_json(wei: U256) -> String {
    serde_json::json!({
        "balance_wei": wei.to_string(),
        "balance": wei_to_ether(wei),
    })
    .to_string()
}
