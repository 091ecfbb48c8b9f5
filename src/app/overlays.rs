use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent};
use log::debug;

use super::keyboard::edit_text;
use super::state::{
    AgentEditorState, AgentPickerState, ConfirmDeleteState, DeleteSubject, OverlayState,
    PendingAction, UploadPromptState,
};
use super::{App, TextInput};
use crate::api::models::{Agent, Batch};
use crate::confirm::ConfirmChoice;

impl App {
    pub(crate) fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub(crate) fn open_agent_editor(&mut self, agent: Option<&Agent>) {
        let state = match agent {
            Some(agent) => AgentEditorState::edit(agent),
            None => AgentEditorState::create(),
        };
        debug!("Opening agent editor: {}", state.title());
        self.overlay = Some(OverlayState::AgentEditor(state));
    }

    pub(crate) fn open_delete_agent(&mut self, agent: &Agent) {
        if self.registry.request_delete(agent) {
            self.overlay = Some(OverlayState::ConfirmDelete(ConfirmDeleteState::new(
                DeleteSubject::Agent(agent.clone()),
            )));
        }
    }

    pub(crate) fn open_delete_batch(&mut self, batch: &Batch) {
        if self.batches.request_delete(batch) {
            self.overlay = Some(OverlayState::ConfirmDelete(ConfirmDeleteState::new(
                DeleteSubject::Batch(batch.clone()),
            )));
        } else {
            self.set_status(String::from("Active batches cannot be deleted"));
        }
    }

    pub(crate) fn open_upload_prompt(&mut self) {
        if let Err(err) = self.batches.check_upload() {
            self.set_status(err.to_string());
            return;
        }
        self.overlay = Some(OverlayState::UploadPrompt(UploadPromptState {
            path: TextInput::new(),
            error: None,
        }));
    }

    pub(crate) fn open_agent_picker(&mut self) {
        if self.batches.check_agents_for_lists() {
            self.overlay = Some(OverlayState::AgentPicker(AgentPickerState::default()));
        }
    }

    /// Routes a key to the open overlay. The overlay is taken out of `self`
    /// and put back unless the key closed it.
    pub(crate) fn handle_overlay_key(&mut self, key: KeyEvent) {
        let Some(overlay) = self.overlay.take() else {
            return;
        };
        self.overlay = match overlay {
            OverlayState::AgentEditor(state) => self.agent_editor_key(key, state),
            OverlayState::ConfirmDelete(state) => self.confirm_delete_key(key, state),
            OverlayState::UploadPrompt(state) => self.upload_prompt_key(key, state),
            OverlayState::BatchDetails { scroll } => match key.code {
                KeyCode::Esc | KeyCode::Enter => {
                    self.batches.close_details();
                    None
                }
                KeyCode::Up => Some(OverlayState::BatchDetails {
                    scroll: scroll.saturating_sub(1),
                }),
                KeyCode::Down => Some(OverlayState::BatchDetails {
                    scroll: scroll.saturating_add(1),
                }),
                _ => Some(OverlayState::BatchDetails { scroll }),
            },
            OverlayState::AgentPicker(state) => self.agent_picker_key(key, state),
            OverlayState::AgentItems { scroll } => match key.code {
                KeyCode::Esc | KeyCode::Enter => {
                    self.batches.close_agent_items();
                    None
                }
                KeyCode::Up => Some(OverlayState::AgentItems {
                    scroll: scroll.saturating_sub(1),
                }),
                KeyCode::Down => Some(OverlayState::AgentItems {
                    scroll: scroll.saturating_add(1),
                }),
                _ => Some(OverlayState::AgentItems { scroll }),
            },
        };
    }

    fn agent_editor_key(
        &mut self,
        key: KeyEvent,
        mut state: AgentEditorState,
    ) -> Option<OverlayState> {
        if self.registry.is_saving() {
            return Some(OverlayState::AgentEditor(state));
        }
        match key.code {
            KeyCode::Esc => return None,
            KeyCode::Tab | KeyCode::Down => state.focus_next(),
            KeyCode::BackTab | KeyCode::Up => state.focus_prev(),
            KeyCode::Enter => {
                let creating = state.is_create();
                let draft = state.draft();
                match draft.validate(creating) {
                    Ok(()) => {
                        state.errors = Default::default();
                        state.error = None;
                        let id = state.agent_id.clone();
                        self.queue(PendingAction::SaveAgent { id, draft });
                    }
                    Err(errors) => state.errors = errors,
                }
            }
            _ => {
                if edit_text(state.focused_mut(), key) {
                    state.error = None;
                }
            }
        }
        Some(OverlayState::AgentEditor(state))
    }

    fn confirm_delete_key(
        &mut self,
        key: KeyEvent,
        mut state: ConfirmDeleteState,
    ) -> Option<OverlayState> {
        let committing = match &state.subject {
            DeleteSubject::Agent(_) => self.registry.pending_delete().is_committing(),
            DeleteSubject::Batch(_) => self.batches.pending_delete().is_committing(),
        };
        if committing || self.has_pending() {
            return Some(OverlayState::ConfirmDelete(state));
        }

        let mut decision = None;
        match key.code {
            KeyCode::Esc => decision = Some(ConfirmChoice::Cancel),
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                state.choice = state.choice.toggle();
            }
            KeyCode::Char('y') => decision = Some(ConfirmChoice::Confirm),
            KeyCode::Char('n') => decision = Some(ConfirmChoice::Cancel),
            KeyCode::Enter => decision = Some(state.choice),
            _ => {}
        }

        match (decision, &state.subject) {
            (Some(ConfirmChoice::Cancel), DeleteSubject::Agent(_)) => {
                self.registry.cancel_delete();
                None
            }
            (Some(ConfirmChoice::Cancel), DeleteSubject::Batch(_)) => {
                self.batches.cancel_delete();
                None
            }
            (Some(ConfirmChoice::Confirm), DeleteSubject::Agent(_)) => {
                self.queue(PendingAction::DeleteAgent);
                Some(OverlayState::ConfirmDelete(state))
            }
            (Some(ConfirmChoice::Confirm), DeleteSubject::Batch(_)) => {
                self.queue(PendingAction::DeleteBatch);
                Some(OverlayState::ConfirmDelete(state))
            }
            (None, _) => Some(OverlayState::ConfirmDelete(state)),
        }
    }

    fn upload_prompt_key(
        &mut self,
        key: KeyEvent,
        mut state: UploadPromptState,
    ) -> Option<OverlayState> {
        if self.batches.is_uploading() {
            return Some(OverlayState::UploadPrompt(state));
        }
        match key.code {
            KeyCode::Esc => return None,
            KeyCode::Enter => {
                let raw = state.path.value().trim().to_string();
                if raw.is_empty() {
                    state.error = Some(String::from("File is required"));
                } else {
                    state.error = None;
                    self.queue(PendingAction::Upload(PathBuf::from(raw)));
                }
            }
            _ => {
                if edit_text(&mut state.path, key) {
                    state.error = None;
                }
            }
        }
        Some(OverlayState::UploadPrompt(state))
    }

    fn agent_picker_key(
        &mut self,
        key: KeyEvent,
        mut state: AgentPickerState,
    ) -> Option<OverlayState> {
        let count = self.batches.agents().len();
        match key.code {
            KeyCode::Esc => return None,
            KeyCode::Up => state.selected = state.selected.saturating_sub(1),
            KeyCode::Down => {
                if state.selected + 1 < count {
                    state.selected += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(agent) = self.batches.agents().get(state.selected).cloned() {
                    self.queue(PendingAction::ViewAgentItems(agent));
                }
            }
            _ => {}
        }
        Some(OverlayState::AgentPicker(state))
    }
}
