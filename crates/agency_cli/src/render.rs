use agency_desk::{Role, TranscriptEntry};

use crate::app::Notice;

pub const THINKING: &str = "Thinking...";
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    }
}

pub fn render_entry(entry: &TranscriptEntry) -> String {
    format!("{}:\n{}\n", role_label(entry.role()), entry.content())
}

pub fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::Info(text) => text.clone(),
        Notice::Error(text) => format!("error: {text}"),
        Notice::Entry(entry) => render_entry(entry),
        Notice::Thinking => THINKING.to_string(),
    }
}
