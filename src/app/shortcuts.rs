use gtk::gdk;
use gtk4 as gtk;
use std::collections::HashMap;

/// Keyboard actions understood by the fullscreen capture and canvas windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Cancel,
    Confirm,
    Clear,
}

impl Action {
    pub fn label(&self) -> &str {
        match self {
            Action::Cancel => "Cancel",
            Action::Confirm => "Confirm",
            Action::Clear => "Clear",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: gdk::Key,
    pub modifiers: gdk::ModifierType,
}

#[derive(Debug, Clone)]
pub struct ShortcutConfig {
    bindings: HashMap<Action, Shortcut>,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        let mut bindings = HashMap::new();

        bindings.insert(
            Action::Cancel,
            Shortcut {
                key: gdk::Key::Escape,
                modifiers: gdk::ModifierType::empty(),
            },
        );
        bindings.insert(
            Action::Confirm,
            Shortcut {
                key: gdk::Key::Return,
                modifiers: gdk::ModifierType::empty(),
            },
        );
        bindings.insert(
            Action::Clear,
            Shortcut {
                key: gdk::Key::BackSpace,
                modifiers: gdk::ModifierType::empty(),
            },
        );

        Self { bindings }
    }
}

impl ShortcutConfig {
    pub fn get_action(&self, key: gdk::Key, modifiers: gdk::ModifierType) -> Option<Action> {
        // Filter out irrelevant modifiers like NumLock/CapsLock/ScrollLock
        let mask = gdk::ModifierType::CONTROL_MASK
            | gdk::ModifierType::SHIFT_MASK
            | gdk::ModifierType::ALT_MASK
            | gdk::ModifierType::SUPER_MASK
            | gdk::ModifierType::META_MASK;

        let clean_mods = modifiers & mask;

        for (action, shortcut) in &self.bindings {
            if shortcut.key == key && shortcut.modifiers == clean_mods {
                return Some(*action);
            }

            // Handle Keypad Enter as alias for Return
            if *action == Action::Confirm
                && key == gdk::Key::KP_Enter
                && shortcut.key == gdk::Key::Return
                && shortcut.modifiers == clean_mods
            {
                return Some(*action);
            }
        }
        None
    }

    pub fn get_shortcut_label(&self, action: Action) -> String {
        if let Some(sc) = self.bindings.get(&action) {
            return gtk::accelerator_name(sc.key, sc.modifiers).to_string();
        }
        String::new()
    }

    /// One-line hint listing the given actions, e.g. `Return: Confirm   Escape: Cancel`
    pub fn hint(&self, actions: &[Action]) -> String {
        actions
            .iter()
            .map(|action| format!("{}: {}", self.get_shortcut_label(*action), action.label()))
            .collect::<Vec<_>>()
            .join("   ")
    }
}
