//! REPL shell: Reedline-based interactive payment session.

use std::sync::Arc;

use anyhow::Result;
use payhub_core::commands::Command;
use payhub_core::display::short_address;
use payhub_core::{ConnectionState, PaymentSubmitter, Session, SessionManager};
use reedline::{DefaultCompleter, DefaultPrompt, DefaultPromptSegment, Reedline, Signal};

use crate::Cli;

pub async fn run_repl(
    cli: &Cli,
    session: &Arc<SessionManager>,
    payments: &PaymentSubmitter,
) -> Result<()> {
    println!("PayHub v{}", env!("CARGO_PKG_VERSION"));
    println!("Target network: {}", cli.network.display_name());
    match &cli.node {
        Some(url) => println!("Node: {url}"),
        None => println!("No wallet provider configured. Start with --node <url> to connect."),
    }
    println!("Type 'help' for a list of commands.");
    println!();

    let commands: Vec<String> = vec![
        "connect".into(),
        "disconnect".into(),
        "balance".into(),
        "bal".into(),
        "address".into(),
        "addr".into(),
        "status".into(),
        "send".into(),
        "transfer".into(),
        "pay".into(),
        "help".into(),
        "exit".into(),
        "quit".into(),
        "q".into(),
    ];
    let completer = Box::new(DefaultCompleter::new(commands));
    let mut line_editor = Reedline::create().with_completer(completer);

    let mut last_seen = session.snapshot();

    loop {
        // Wallet events are handled in the background; report what changed since the last prompt.
        let current = session.snapshot();
        if let Some(notice) = session_notice(&last_seen, &current) {
            println!("{notice}");
        }
        last_seen = current;

        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(prompt_label(&last_seen)),
            DefaultPromptSegment::Empty,
        );

        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match Command::parse(line) {
                    Ok(Command::Exit) => {
                        println!("Goodbye.");
                        break;
                    }
                    Ok(cmd) => {
                        if let Some(prompt_msg) = cmd.confirmation_prompt() {
                            if !cli.yes && !prompt_confirm(&prompt_msg) {
                                println!("Cancelled.");
                                continue;
                            }
                        }
                        match cmd.execute(session, payments, cli.json).await {
                            Ok(output) => {
                                if !output.is_empty() {
                                    println!("{output}");
                                }
                            }
                            Err(e) => {
                                eprintln!("Error: {e}");
                            }
                        }
                        // Changes caused by the command itself were already reported.
                        last_seen = session.snapshot();
                    }
                    Err(e) => {
                        eprintln!("{e}");
                    }
                }
            }
            Ok(Signal::CtrlD) | Ok(Signal::CtrlC) => {
                println!("Goodbye.");
                break;
            }
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        }
    }

    Ok(())
}

fn prompt_label(session: &Session) -> String {
    match (&session.state, &session.account) {
        (ConnectionState::Connected, Some(account)) => {
            format!("[payhub {}]", short_address(account))
        }
        (state, _) => format!("[payhub {state}]"),
    }
}

/// Describe a background change of the session, if there was one worth showing.
fn session_notice(before: &Session, after: &Session) -> Option<String> {
    if before.state == after.state
        && before.account == after.account
        && before.network == after.network
        && before.error == after.error
    {
        return None;
    }
    match (&after.state, &after.error) {
        (ConnectionState::Disconnected, Some(err)) => Some(format!("Wallet session ended: {err}")),
        (ConnectionState::Disconnected, None) => Some("Wallet disconnected.".to_string()),
        (ConnectionState::Connected, _) => {
            let account = after.account.as_ref().map(short_address).unwrap_or_default();
            let network = after
                .network
                .as_ref()
                .map(|n| n.name.clone())
                .unwrap_or_default();
            Some(format!("Connected as {account} on {network}."))
        }
        (state, _) => Some(format!("Wallet session: {state}...")),
    }
}

pub(crate) fn prompt_confirm(prompt: &str) -> bool {
    use std::io::Write;
    print!("{prompt} [y/N]: ");
    std::io::stdout().flush().ok();
    let mut input = String::new();
    std::io::stdin().read_line(&mut input).is_ok() && input.trim().eq_ignore_ascii_case("y")
}
