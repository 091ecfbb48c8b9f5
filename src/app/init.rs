use std::sync::Arc;
use std::time::Duration;

use log::debug;

use super::state::{AuthForm, AuthMode, PendingAction};
use super::App;
use crate::api::ConsoleApi;
use crate::batches::BatchBoard;
use crate::dashboard::Dashboard;
use crate::guard::{self, Route};
use crate::registry::AgentRegistry;
use crate::session::SessionManager;

pub(crate) const SIGNED_OUT_HINT: &str = "Tab to switch fields, Enter to sign in, Ctrl+R to register, Ctrl+Q to quit";

impl App {
    /// Builds the shell around an already restored session.
    ///
    /// Startup restoration must finish before this is called so the first
    /// frame never shows a protected screen to a signed-out operator.
    pub fn new(session: SessionManager, api: Arc<dyn ConsoleApi>) -> Self {
        let authenticated = session.is_authenticated();
        let route = guard::guard(Route::Dashboard, authenticated);
        debug!("Starting console on {:?} (authenticated: {})", route, authenticated);

        let status_message = match session.current_user() {
            Some(user) => format!("Signed in as: {}", user.email),
            None => String::from(SIGNED_OUT_HINT),
        };

        let mut app = Self {
            should_quit: false,
            route,
            session,
            api,
            dashboard: Dashboard::new(),
            registry: AgentRegistry::new(),
            batches: BatchBoard::new(),
            login: AuthForm::new(AuthMode::Login),
            register: AuthForm::new(AuthMode::Register),
            overlay: None,
            status_message,
            pending: None,
            status_set_at: None,
            status_ttl: Duration::from_secs(5),
            tick_rate: Duration::from_millis(250),
        };
        if authenticated {
            app.queue(PendingAction::RefreshDashboard);
        }
        app
    }
}
