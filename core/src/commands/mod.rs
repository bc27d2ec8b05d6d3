/// Command definitions and parsing for the payment REPL and one-shot mode.
mod execute;
mod help;
mod parse;

pub use help::help_text;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Connect the wallet and verify the target network
    Connect,
    /// Drop the session
    Disconnect,
    /// Show (and refresh) the account balance
    Balance,
    /// Show the connected account
    Address,
    /// Show session state, network and last error
    Status,
    /// Send ETH: send <address> <amount>
    ///
    /// Both fields are kept raw; validation happens at submission so that
    /// failures surface as payment errors.
    Send { recipient: String, amount: String },
    /// Print help
    Help { command: Option<String> },
    /// Exit
    Exit,
}

impl Command {
    /// Returns a confirmation prompt if this command should ask before executing.
    pub fn confirmation_prompt(&self) -> Option<String> {
        match self {
            Command::Send { recipient, amount } => {
                Some(format!("Send {amount} ETH to {recipient}?"))
            }
            _ => None,
        }
    }

    /// Commands that need a connected session; one-shot mode connects first.
    pub fn needs_connection(&self) -> bool {
        matches!(
            self,
            Command::Balance | Command::Address | Command::Send { .. }
        )
    }
}
