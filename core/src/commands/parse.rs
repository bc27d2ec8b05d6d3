use anyhow::{bail, Result};

use super::Command;

impl Command {
    /// Parse a command from a raw input string.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            bail!("No command entered. Type 'help' for a list of commands.");
        }

        let mut parts = input.split_whitespace();
        let Some(cmd) = parts.next().map(str::to_lowercase) else {
            bail!("No command entered. Type 'help' for a list of commands.");
        };
        let arg1 = parts.next();
        let arg2 = parts.next();
        let extra = parts.next();

        match cmd.as_str() {
            "connect" | "c" => Ok(Command::Connect),

            "disconnect" | "dc" => Ok(Command::Disconnect),

            "balance" | "bal" => Ok(Command::Balance),

            "address" | "addr" => Ok(Command::Address),

            "status" | "st" => Ok(Command::Status),

            "send" | "transfer" | "pay" => {
                let recipient = arg1.ok_or_else(|| {
                    anyhow::anyhow!("Missing recipient. Usage: send <address> <amount>")
                })?;
                let amount = arg2.ok_or_else(|| {
                    anyhow::anyhow!("Missing amount. Usage: send <address> <amount>")
                })?;
                if let Some(extra) = extra {
                    bail!("Unexpected argument '{extra}'. Usage: send <address> <amount>");
                }
                Ok(Command::Send {
                    recipient: recipient.to_string(),
                    amount: amount.to_string(),
                })
            }

            "help" | "h" | "?" => Ok(Command::Help {
                command: arg1.map(str::to_lowercase),
            }),

            "exit" | "quit" | "q" => Ok(Command::Exit),

            other => bail!("Unknown command: '{other}'. Type 'help' for a list of commands."),
        }
    }
}
