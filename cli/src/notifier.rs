use std::collections::HashMap;
use std::sync::Mutex;

use payhub_core::{Notifier, Toast, ToastKind};

/// Prints toasts to the terminal. An update for an already shown id is only
/// printed when its text changed. An id is forgotten once its final toast is shown.
#[derive(Default)]
pub struct TerminalNotifier {
    shown: Mutex<HashMap<String, (String, String)>>,
}

impl TerminalNotifier {
    fn render(toast: &Toast) -> String {
        let marker = match toast.kind {
            ToastKind::Pending => "...",
            ToastKind::Success => "ok ",
            ToastKind::Error => "!! ",
        };
        let mut out = format!("[{marker}] {}: {}", toast.title, toast.description);
        if let Some(link) = &toast.link {
            out.push_str(&format!("\n      {link}"));
        }
        out
    }

    /// Whether `toast` differs from what was last printed for its id.
    fn should_print(&self, toast: &Toast) -> bool {
        let key = (toast.title.clone(), toast.description.clone());
        let mut shown = self.shown.lock().unwrap_or_else(|e| e.into_inner());
        if toast.kind != ToastKind::Pending {
            return shown.remove(&toast.id).as_ref() != Some(&key);
        }
        if shown.get(&toast.id) == Some(&key) {
            return false;
        }
        shown.insert(toast.id.clone(), key);
        true
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, toast: Toast) {
        if !self.should_print(&toast) {
            return;
        }
        let line = Self::render(&toast);
        match toast.kind {
            ToastKind::Error => eprintln!("{line}"),
            _ => println!("{line}"),
        }
    }
}
