#[must_use]
pub fn help_text(command: Option<&str>) -> String {
    match command {
        Some("connect") | Some("c") => {
            "connect\n  Request account access and verify the wallet is on the target network.\n  Asks the wallet to switch networks if needed.\n  Alias: c".to_string()
        }
        Some("disconnect") | Some("dc") => {
            "disconnect\n  Forget the connected account. Does not revoke wallet permissions.\n  Alias: dc".to_string()
        }
        Some("balance") | Some("bal") => {
            "balance\n  Fetch and show the ETH balance of the connected account.\n  Alias: bal".to_string()
        }
        Some("address") | Some("addr") => {
            "address\n  Show the connected account address.\n  Alias: addr".to_string()
        }
        Some("status") | Some("st") => {
            "status\n  Show the connection state, network, balance and last error.\n  Alias: st".to_string()
        }
        Some("send") | Some("transfer") | Some("pay") => {
            "send <address> <amount>\n  Send ETH from the connected account.\n  Amount is in ETH (e.g. '0.01').\n  Waits for one confirmation.\n  Example: send 0x1111111111111111111111111111111111111111 0.01\n  Aliases: transfer, pay".to_string()
        }
        Some("exit") | Some("quit") | Some("q") => {
            "exit\n  Exit.\n  Aliases: quit, q".to_string()
        }
        Some(other) => format!("Unknown command: '{other}'. Type 'help' for a list."),
        None => {
            "Available commands:\n\
             \n\
             \x20 connect          Connect the wallet\n\
             \x20 disconnect       Disconnect the wallet\n\
             \x20 balance          Show account balance\n\
             \x20 address          Show account address\n\
             \x20 status           Show session status\n\
             \x20 send             Send ETH to an address\n\
             \x20 help [cmd]       Show help for a command\n\
             \x20 exit             Exit\n\
             \n\
             Type 'help <command>' for detailed help on a specific command."
                .to_string()
        }
    }
}
