//! Declarative keyboard shortcut table.
//!
//! Entries are matched first-match-wins in table order. A matched entry
//! suppresses the browser's native action for the key unless it opts out
//! with `allow_default`. Entries that would fight with text entry (Delete,
//! Backspace) are skipped while a text field has focus, so typing keeps
//! working.

#[cfg(test)]
#[path = "shortcuts_test.rs"]
mod shortcuts_test;

use crate::interaction::Modifiers;

/// Something the controller does in response to a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Close any open editor on the selected item and clear the selection.
    ClearSelection,
    /// Delete the selected item.
    DeleteSelection,
    /// Save the open inline editor.
    CommitEdit,
    /// Send every pending write now.
    FlushPending,
}

/// Modifier state an entry requires. Ctrl and Meta are interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierMatch {
    pub command: bool,
    pub shift: bool,
    pub alt: bool,
}

impl ModifierMatch {
    pub const NONE: Self = Self { command: false, shift: false, alt: false };
    pub const COMMAND: Self = Self { command: true, shift: false, alt: false };

    #[must_use]
    pub fn matches(self, modifiers: Modifiers) -> bool {
        self.command == modifiers.command() && self.shift == modifiers.shift && self.alt == modifiers.alt
    }
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    /// Key name as reported by the browser (e.g. `"Delete"`, `"s"`). Compared case-insensitively.
    pub key: &'static str,
    pub modifiers: ModifierMatch,
    pub command: Command,
    /// Let the browser's native action run as well.
    pub allow_default: bool,
    /// Still active while a text field has focus.
    pub in_text_fields: bool,
    pub description: &'static str,
}

impl Shortcut {
    #[must_use]
    pub const fn new(key: &'static str, modifiers: ModifierMatch, command: Command, description: &'static str) -> Self {
        Self { key, modifiers, command, allow_default: false, in_text_fields: false, description }
    }

    #[must_use]
    pub const fn allow_default(mut self) -> Self {
        self.allow_default = true;
        self
    }

    #[must_use]
    pub const fn in_text_fields(mut self) -> Self {
        self.in_text_fields = true;
        self
    }

    fn applies(&self, key: &str, modifiers: Modifiers, text_focused: bool) -> bool {
        self.key.eq_ignore_ascii_case(key) && self.modifiers.matches(modifiers) && (!text_focused || self.in_text_fields)
    }
}

/// What to do with a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyOutcome {
    pub command: Option<Command>,
    /// Suppress the browser's native action.
    pub prevent_default: bool,
}

impl KeyOutcome {
    pub const UNHANDLED: Self = Self { command: None, prevent_default: false };
}

/// Ordered list of shortcuts.
#[derive(Debug, Clone)]
pub struct ShortcutTable {
    entries: Vec<Shortcut>,
}

impl Default for ShortcutTable {
    fn default() -> Self {
        Self::new(vec![
            Shortcut::new("Escape", ModifierMatch::NONE, Command::ClearSelection, "Close editor and clear selection")
                .in_text_fields(),
            Shortcut::new("Delete", ModifierMatch::NONE, Command::DeleteSelection, "Delete selected item"),
            Shortcut::new("Backspace", ModifierMatch::NONE, Command::DeleteSelection, "Delete selected item"),
            Shortcut::new("Enter", ModifierMatch::COMMAND, Command::CommitEdit, "Save the open editor").in_text_fields(),
            Shortcut::new("s", ModifierMatch::COMMAND, Command::FlushPending, "Save pending changes now")
                .in_text_fields(),
        ])
    }
}

impl ShortcutTable {
    #[must_use]
    pub fn new(entries: Vec<Shortcut>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[Shortcut] {
        &self.entries
    }

    /// First entry that applies to this key press.
    #[must_use]
    pub fn lookup(&self, key: &str, modifiers: Modifiers, text_focused: bool) -> Option<&Shortcut> {
        self.entries
            .iter()
            .find(|entry| entry.applies(key, modifiers, text_focused))
    }

    /// Resolve a key press into a command and the native-action decision.
    #[must_use]
    pub fn resolve(&self, key: &str, modifiers: Modifiers, text_focused: bool) -> KeyOutcome {
        match self.lookup(key, modifiers, text_focused) {
            Some(entry) => KeyOutcome { command: Some(entry.command), prevent_default: !entry.allow_default },
            None => KeyOutcome::UNHANDLED,
        }
    }
}
