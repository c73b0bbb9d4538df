//! Visible panel elements.

use std::sync::Mutex;

use console::{Term, style};
use dialoguer::Confirm;
use tracing::warn;

/// UI effects the control panel performs.
pub trait PanelView {
    /// Replace the editor content.
    fn set_editor(&self, markup: &str);

    /// Empty the editor.
    fn clear_editor(&self);

    /// Remove the button for slide `id`.
    fn remove_slide_button(&self, id: &str);

    /// Show a blocking message.
    fn alert(&self, message: &str);

    /// Ask a yes/no question.
    fn confirm(&self, message: &str) -> bool;
}

/// Terminal rendering of the panel.
pub struct ConsoleView {
    term: Term,
    assume_yes: bool,
    buttons: Mutex<Vec<String>>,
}

impl ConsoleView {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            term: Term::stdout(),
            assume_yes,
            buttons: Mutex::new(Vec::new()),
        }
    }

    /// Replace the slide buttons and print them.
    pub fn set_slide_buttons(&self, ids: Vec<String>) {
        *self.buttons.lock().unwrap_or_else(|e| e.into_inner()) = ids;
        self.print_buttons();
    }

    pub fn print_buttons(&self) {
        let buttons = self.buttons.lock().unwrap_or_else(|e| e.into_inner());
        let line = if buttons.is_empty() {
            style("(no slides)").dim().to_string()
        } else {
            buttons
                .iter()
                .map(|id| format!("[{}]", style(id).cyan()))
                .collect::<Vec<_>>()
                .join(" ")
        };
        self.write(&format!("Slides: {line}"));
    }

    fn write(&self, line: &str) {
        if let Err(e) = self.term.write_line(line) {
            warn!("Failed to write to terminal: {}", e);
        }
    }
}

impl PanelView for ConsoleView {
    fn set_editor(&self, markup: &str) {
        self.write(&style("── editor ──").bold().to_string());
        self.write(markup);
        self.write(&style("────────────").bold().to_string());
    }

    fn clear_editor(&self) {
        self.write(&style("(editor cleared)").dim().to_string());
    }

    fn remove_slide_button(&self, id: &str) {
        self.buttons
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|b| b != id);
        self.print_buttons();
    }

    fn alert(&self, message: &str) {
        self.write(&style(message).yellow().bold().to_string());
    }

    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        match Confirm::new().with_prompt(message).default(false).interact() {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Confirmation prompt failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assume_yes_confirms_without_prompt() {
        let view = ConsoleView::new(true);
        assert!(view.confirm("Delete?"));
    }

    #[test]
    fn test_remove_slide_button() {
        let view = ConsoleView::new(true);
        view.set_slide_buttons(vec!["abc".to_string(), "xyz".to_string()]);
        view.remove_slide_button("abc");
        assert_eq!(*view.buttons.lock().unwrap(), vec!["xyz".to_string()]);
    }
}
