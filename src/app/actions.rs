use std::time::Instant;

use log::{debug, info};

use super::state::{AuthMode, OverlayState, PendingAction};
use super::App;
use crate::api::models::BatchFilter;
use crate::guard::{self, Route};
use crate::registry::FormError;
use crate::validation::{self, ValidationErrors};

const SESSION_ENDED: &str = "Your session has ended. Please sign in again.";
const REGISTERED: &str = "Registration successful. Please sign in.";

impl App {
    /// True while a queued or running request belongs to any view.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
            || self.login.submitting
            || self.register.submitting
            || self.dashboard.is_loading()
            || self.registry.is_busy()
            || self.batches.is_busy()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn take_pending(&mut self) -> Option<PendingAction> {
        self.pending.take()
    }

    /// Queues `action` and flags its view as loading. Refused while another
    /// request is outstanding so a key held down cannot duplicate requests.
    pub(crate) fn queue(&mut self, action: PendingAction) -> bool {
        if self.is_busy() {
            debug!("Ignoring {:?}: a request is already in flight", action);
            return false;
        }
        match &action {
            PendingAction::Login { .. } => self.login.submitting = true,
            PendingAction::Register { .. } => self.register.submitting = true,
            PendingAction::RefreshDashboard => self.dashboard.mark_loading(),
            PendingAction::RefreshAgents => self.registry.mark_loading(),
            PendingAction::SaveAgent { .. } => self.registry.mark_saving(),
            PendingAction::Upload(_) => self.batches.mark_uploading(),
            PendingAction::RefreshLists
            | PendingAction::SetFilter(_)
            | PendingAction::ViewDetails(_)
            | PendingAction::UpdateStatus { .. }
            | PendingAction::ViewAgentItems(_) => self.batches.mark_loading(),
            PendingAction::DeleteAgent | PendingAction::DeleteBatch => {}
        }
        self.pending = Some(action);
        true
    }

    /// Runs every queued action. The event loop redraws between actions
    /// instead; this is for callers without a terminal.
    pub async fn drain_pending(&mut self) {
        while let Some(action) = self.take_pending() {
            self.run_pending(action).await;
        }
    }

    pub async fn run_pending(&mut self, action: PendingAction) {
        debug!("Running {:?}", action);
        let api = self.api.clone();
        let api = api.as_ref();
        match action {
            PendingAction::Login { email, password } => {
                let outcome = self.session.login(&email, &password).await;
                self.login.submitting = false;
                match outcome {
                    Ok(user) => {
                        self.login.reset();
                        self.login.notice = None;
                        self.set_status(format!("Signed in as: {}", user.email));
                        self.navigate(Route::Dashboard);
                    }
                    Err(err) => self.login.error = Some(err.0),
                }
            }
            PendingAction::Register { email, password } => {
                let outcome = self.session.register(&email, &password).await;
                self.register.submitting = false;
                match outcome {
                    Ok(()) => {
                        self.register.reset();
                        self.login.reset();
                        self.login.notice = Some(REGISTERED.to_string());
                        self.navigate(Route::Login);
                    }
                    Err(err) => self.register.error = Some(err.0),
                }
            }
            PendingAction::RefreshDashboard => self.dashboard.refresh(api).await,
            PendingAction::RefreshAgents => self.registry.refresh(api).await,
            PendingAction::RefreshLists => {
                self.batches.refresh_agents(api).await;
                self.batches.refresh(api).await;
            }
            PendingAction::SaveAgent { id, draft } => {
                let outcome = match id.as_deref() {
                    None => self.registry.create(api, &draft).await,
                    Some(id) => self.registry.update(api, id, &draft).await,
                };
                match outcome {
                    Ok(()) => {
                        self.close_overlay();
                        if let Some(notice) = self.registry.notice().map(str::to_string) {
                            self.set_status(notice);
                        }
                    }
                    Err(err) => self.agent_editor_failed(err),
                }
            }
            PendingAction::DeleteAgent => {
                if self.registry.confirm_delete(api).await {
                    self.close_overlay();
                    if let Some(notice) = self.registry.notice().map(str::to_string) {
                        self.set_status(notice);
                    }
                }
            }
            PendingAction::SetFilter(filter) => self.batches.set_filter(api, filter).await,
            PendingAction::Upload(path) => {
                if self.batches.upload(api, &path).await.is_ok() {
                    self.close_overlay();
                    if let Some(notice) = self.batches.notice().map(str::to_string) {
                        self.set_status(notice);
                    }
                } else if let Some(OverlayState::UploadPrompt(state)) = self.overlay.as_mut() {
                    state.error = self.batches.error().map(str::to_string);
                }
            }
            PendingAction::ViewDetails(batch_id) => {
                self.batches.view_details(api, &batch_id).await;
                if self.batches.details().is_some() {
                    self.overlay = Some(OverlayState::BatchDetails { scroll: 0 });
                }
            }
            PendingAction::UpdateStatus { batch_id, status } => {
                if self.batches.update_status(api, &batch_id, status).await
                    && let Some(notice) = self.batches.notice().map(str::to_string)
                {
                    self.set_status(notice);
                }
            }
            PendingAction::DeleteBatch => {
                if self.batches.confirm_delete(api).await {
                    self.close_overlay();
                    if let Some(notice) = self.batches.notice().map(str::to_string) {
                        self.set_status(notice);
                    }
                }
            }
            PendingAction::ViewAgentItems(agent) => {
                self.batches.view_agent_items(api, &agent).await;
                if self.batches.agent_items(&agent.id).is_some() {
                    self.overlay = Some(OverlayState::AgentItems { scroll: 0 });
                }
            }
        }
        self.enforce_session();
    }

    fn agent_editor_failed(&mut self, err: FormError) {
        if let Some(OverlayState::AgentEditor(state)) = self.overlay.as_mut() {
            match err {
                FormError::Invalid(errors) => state.errors = errors,
                FormError::Rejected(message) => state.error = Some(message),
            }
        }
    }

    /// Shows `requested`, or wherever the route guard sends the operator
    /// instead, and fetches that screen's data.
    pub fn navigate(&mut self, requested: Route) {
        let route = guard::guard(requested, self.session.is_authenticated());
        if route != requested {
            debug!("Route guard redirected {:?} to {:?}", requested, route);
        }
        self.overlay = None;
        self.batches.row_menu.close();
        self.route = route;
        match route {
            Route::Dashboard => {
                self.queue(PendingAction::RefreshDashboard);
            }
            Route::Agents => {
                self.queue(PendingAction::RefreshAgents);
            }
            Route::Lists => {
                self.queue(PendingAction::RefreshLists);
            }
            Route::Login | Route::Register => {}
        }
    }

    /// Sends the operator back to sign-in once the session is gone, whether
    /// by logout or because the server rejected the credential.
    pub(crate) fn enforce_session(&mut self) {
        if self.route.is_protected() && !self.session.is_authenticated() {
            info!("Session ended, returning to sign-in");
            self.overlay = None;
            self.pending = None;
            self.route = Route::Login;
            self.login.notice = Some(SESSION_ENDED.to_string());
            self.set_status(SESSION_ENDED.to_string());
        }
    }

    pub fn logout(&mut self) {
        if !self.session.is_authenticated() {
            return;
        }
        self.session.logout();
        self.overlay = None;
        self.pending = None;
        self.route = Route::Login;
        self.login.reset();
        self.set_status(String::from("Signed out"));
    }

    pub(crate) fn submit_auth(&mut self, mode: AuthMode) {
        let form = match mode {
            AuthMode::Login => &mut self.login,
            AuthMode::Register => &mut self.register,
        };
        let email = form.email.value().trim().to_string();
        let password = form.password.value().to_string();
        let mut errors = ValidationErrors::default();
        errors.check(validation::validate_email(&email));
        match mode {
            AuthMode::Login => errors.check(validation::validate_login_password(&password)),
            AuthMode::Register => {
                errors.check(validation::validate_new_password(&password));
                errors.check(validation::validate_confirmation(
                    &password,
                    form.confirm.value(),
                ));
            }
        }
        form.error = None;
        if !errors.is_empty() {
            form.errors = errors;
            return;
        }
        form.errors = ValidationErrors::default();
        let action = match mode {
            AuthMode::Login => PendingAction::Login { email, password },
            AuthMode::Register => PendingAction::Register { email, password },
        };
        self.queue(action);
    }

    pub(crate) fn cycle_filter(&mut self) {
        let next: BatchFilter = self.batches.filter().next();
        self.queue(PendingAction::SetFilter(next));
    }

    pub(crate) fn set_status(&mut self, message: String) {
        self.status_message = message;
        self.status_set_at = Some(Instant::now());
    }
}
