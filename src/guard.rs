//! Which screen may be shown for the current session.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Agents,
    Lists,
}

impl Route {
    /// Screens reachable from the navigation bar once signed in.
    pub const NAVIGATION: [Route; 3] = [Route::Dashboard, Route::Agents, Route::Lists];

    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard | Route::Agents | Route::Lists)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Sign in",
            Route::Register => "Register",
            Route::Dashboard => "Dashboard",
            Route::Agents => "Agents",
            Route::Lists => "Lists",
        }
    }
}

/// Resolves the screen actually shown for `requested`.
pub fn guard(requested: Route, authenticated: bool) -> Route {
    match (requested.is_protected(), authenticated) {
        (true, false) => Route::Login,
        (false, true) => Route::Dashboard,
        _ => requested,
    }
}
