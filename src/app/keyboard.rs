use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::state::{AuthMode, PendingAction};
use super::{App, TextInput};
use crate::batches::BatchAction;
use crate::guard::Route;

/// Applies an editing key to `input`. Returns true when the key was used.
pub(crate) fn edit_text(input: &mut TextInput, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            input.insert_char(ch)
        }
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        _ => return false,
    }
    true
}

impl App {
    /// Entry point for keyboard input.
    ///
    /// Global shortcuts win, then the open overlay, then the current screen.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.handle_global_shortcuts(key) {
            return;
        }
        if self.overlay.is_some() {
            self.handle_overlay_key(key);
            return;
        }
        match self.route {
            Route::Login => self.handle_auth_key(key, AuthMode::Login),
            Route::Register => self.handle_auth_key(key, AuthMode::Register),
            Route::Dashboard => self.handle_dashboard_key(key),
            Route::Agents => self.handle_agents_key(key),
            Route::Lists => self.handle_lists_key(key),
        }
    }

    fn handle_global_shortcuts(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') if ctrl => self.should_quit = true,
            KeyCode::Char('l') if ctrl => self.logout(),
            KeyCode::F(n @ 1..=3) if self.session.is_authenticated() => {
                if !self.is_busy() {
                    self.navigate(Route::NAVIGATION[usize::from(n) - 1]);
                }
            }
            _ => return false,
        }
        true
    }

    fn handle_auth_key(&mut self, key: KeyEvent, mode: AuthMode) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let form = match mode {
            AuthMode::Login => &mut self.login,
            AuthMode::Register => &mut self.register,
        };
        if form.submitting {
            return;
        }
        match key.code {
            KeyCode::Char('r') if ctrl && mode == AuthMode::Login => {
                self.login.notice = None;
                self.navigate(Route::Register);
            }
            KeyCode::Esc if mode == AuthMode::Register => self.navigate(Route::Login),
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
            KeyCode::Enter => self.submit_auth(mode),
            _ => {
                if edit_text(form.focused_mut(), key) {
                    form.error = None;
                }
            }
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') => {
                self.queue(PendingAction::RefreshDashboard);
            }
            KeyCode::Char('a') => self.navigate(Route::Agents),
            KeyCode::Char('l') => self.navigate(Route::Lists),
            KeyCode::Esc => self.dashboard.dismiss_error(),
            _ => {}
        }
    }

    fn handle_agents_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.registry.select_prev(),
            KeyCode::Down => self.registry.select_next(),
            KeyCode::Esc => self.registry.dismiss_error(),
            _ if self.is_busy() => {}
            KeyCode::Char('r') => {
                self.queue(PendingAction::RefreshAgents);
            }
            KeyCode::Char('n') => self.open_agent_editor(None),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(agent) = self.registry.selected().cloned() {
                    self.open_agent_editor(Some(&agent));
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(agent) = self.registry.selected().cloned() {
                    self.open_delete_agent(&agent);
                }
            }
            _ => {}
        }
    }

    fn handle_lists_key(&mut self, key: KeyEvent) {
        if self.batches.row_menu.open_row.is_some() {
            self.handle_row_menu_key(key);
            return;
        }
        match key.code {
            KeyCode::Up => self.batches.select_prev(),
            KeyCode::Down => self.batches.select_next(),
            KeyCode::Esc => {
                self.batches.dismiss_error();
                self.batches.dismiss_notice();
            }
            _ if self.is_busy() => {}
            KeyCode::Enter => {
                if let Some(id) = self.batches.selected().map(|b| b.batch_id.clone()) {
                    self.batches.row_menu.toggle(&id);
                }
            }
            KeyCode::Char('r') => {
                self.queue(PendingAction::RefreshLists);
            }
            KeyCode::Char('f') => self.cycle_filter(),
            KeyCode::Char('u') => self.open_upload_prompt(),
            KeyCode::Char('a') => self.open_agent_picker(),
            _ => {}
        }
    }

    fn handle_row_menu_key(&mut self, key: KeyEvent) {
        let actions = self.batches.open_menu_actions();
        match key.code {
            KeyCode::Esc => self.batches.row_menu.close(),
            KeyCode::Up => {
                self.batches.row_menu.cursor = self.batches.row_menu.cursor.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.batches.row_menu.cursor + 1 < actions.len() {
                    self.batches.row_menu.cursor += 1;
                }
            }
            KeyCode::Enter if !self.is_busy() => {
                let Some(action) = actions.get(self.batches.row_menu.cursor).copied() else {
                    return;
                };
                self.run_row_action(action);
            }
            _ => {}
        }
    }

    fn run_row_action(&mut self, action: BatchAction) {
        let Some(batch) = self.batches.selected().cloned() else {
            self.batches.row_menu.close();
            return;
        };
        self.batches.row_menu.close();
        match action {
            BatchAction::ViewDetails => {
                self.queue(PendingAction::ViewDetails(batch.batch_id));
            }
            BatchAction::Complete | BatchAction::Archive => {
                if let Some(status) = action.target_status() {
                    self.queue(PendingAction::UpdateStatus {
                        batch_id: batch.batch_id,
                        status,
                    });
                }
            }
            BatchAction::Delete => self.open_delete_batch(&batch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn edit_text_ignores_control_chords() {
        let mut input = TextInput::new();
        assert!(edit_text(&mut input, key(KeyCode::Char('a'))));
        assert!(!edit_text(
            &mut input,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
        ));
        assert!(edit_text(&mut input, key(KeyCode::Backspace)));
        assert!(input.is_empty());
        assert!(!edit_text(&mut input, key(KeyCode::F(5))));
    }
}
