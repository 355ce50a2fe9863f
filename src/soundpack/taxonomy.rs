//! Event vocabulary mapping between Claude Code hooks and Opencode events.
//!
//! The forward table is not injective (`Stop`, `SubagentStop` and `PreCompact`
//! all land on `session.idle`), so the reverse table is authored separately
//! instead of being derived by inversion. Each ambiguous Opencode event names
//! exactly one Claude hook, and tests pin that choice.
//!
//! Inverting the forward table with later entries winning would send
//! `session.idle` to `PreCompact`. The reverse table sends it to `Stop`, the
//! hook that fires when a turn ends.

/// Claude Code hook type to Opencode event.
const FORWARD: &[(&str, &str)] = &[
    ("PreToolUse", "tool.execute.before"),
    ("PostToolUse", "tool.execute.after"),
    ("Notification", "chat.message"),
    ("Stop", "session.idle"),
    ("SubagentStop", "session.idle"),
    ("UserPromptSubmit", "chat.message"),
    ("PreCompact", "session.idle"),
];

/// Opencode event to Claude Code hook type.
const REVERSE: &[(&str, &str)] = &[
    ("tool.execute.before", "PreToolUse"),
    ("tool.execute.after", "PostToolUse"),
    ("chat.message", "UserPromptSubmit"),
    ("session.idle", "Stop"),
];

/// Every event name the Opencode plugin runtime emits.
const OPENCODE_EVENTS: &[&str] = &[
    "chat.message",
    "chat.params",
    "permission.ask",
    "permission.updated",
    "permission.replied",
    "tool.execute.before",
    "tool.execute.after",
    "session.idle",
    "session.created",
    "session.updated",
    "session.deleted",
    "session.error",
    "session.compacted",
    "message.updated",
    "message.removed",
    "file.edited",
    "command.executed",
];

/// Map a Claude Code hook type to its Opencode event.
#[must_use]
pub fn to_opencode(claude_event: &str) -> Option<&'static str> {
    FORWARD
        .iter()
        .find(|(claude, _)| *claude == claude_event)
        .map(|(_, opencode)| *opencode)
}

/// Map an Opencode event to the Claude Code hook type chosen for it.
#[must_use]
pub fn to_claude(opencode_event: &str) -> Option<&'static str> {
    REVERSE
        .iter()
        .find(|(opencode, _)| *opencode == opencode_event)
        .map(|(_, claude)| *claude)
}

#[must_use]
pub fn is_opencode_event(name: &str) -> bool {
    OPENCODE_EVENTS.contains(&name)
}

#[must_use]
pub fn is_claude_hook(name: &str) -> bool {
    FORWARD.iter().any(|(claude, _)| *claude == name)
}

/// Claude Code hook types, in table order.
pub fn claude_hooks() -> impl Iterator<Item = &'static str> {
    FORWARD.iter().map(|(claude, _)| *claude)
}

#[must_use]
pub const fn opencode_events() -> &'static [&'static str] {
    OPENCODE_EVENTS
}

/// Opencode events reached by more than one Claude hook type, with every
/// preimage in table order.
#[must_use]
pub fn ambiguous_opencode_events() -> Vec<(&'static str, Vec<&'static str>)> {
    let mut out: Vec<(&'static str, Vec<&'static str>)> = Vec::new();
    for &(claude, opencode) in FORWARD {
        match out.iter_mut().find(|(event, _)| *event == opencode) {
            Some((_, sources)) => sources.push(claude),
            None => out.push((opencode, vec![claude])),
        }
    }
    out.retain(|(_, sources)| sources.len() > 1);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_lookups() {
        assert_eq!(to_opencode("PreToolUse"), Some("tool.execute.before"));
        assert_eq!(to_opencode("SubagentStop"), Some("session.idle"));
        assert_eq!(to_opencode("SessionStart"), None);
    }

    #[test]
    fn reverse_choices_are_pinned() {
        assert_eq!(to_claude("tool.execute.before"), Some("PreToolUse"));
        assert_eq!(to_claude("tool.execute.after"), Some("PostToolUse"));
        assert_eq!(to_claude("chat.message"), Some("UserPromptSubmit"));
        assert_eq!(to_claude("session.idle"), Some("Stop"));
        assert_eq!(to_claude("permission.ask"), None);
    }

    #[test]
    fn reverse_entries_are_preimages() {
        for (opencode, claude) in REVERSE {
            assert_eq!(to_opencode(claude), Some(*opencode), "{claude} -> {opencode}");
        }
    }

    #[test]
    fn every_forward_image_is_reversible() {
        for (_, opencode) in FORWARD {
            assert!(to_claude(opencode).is_some(), "{opencode} has no reverse entry");
            assert!(is_opencode_event(opencode));
        }
    }

    #[test]
    fn ambiguity_is_reported() {
        let ambiguous = ambiguous_opencode_events();
        let names: Vec<_> = ambiguous.iter().map(|(event, _)| *event).collect();
        assert_eq!(names, vec!["chat.message", "session.idle"]);
        let idle = &ambiguous[1].1;
        assert_eq!(idle, &vec!["Stop", "SubagentStop", "PreCompact"]);
    }

    #[test]
    fn opencode_vocabulary_size() {
        assert_eq!(opencode_events().len(), 17);
        assert_eq!(claude_hooks().count(), 7);
    }
}
