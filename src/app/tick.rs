use std::time::Duration;

use super::App;
use super::init::SIGNED_OUT_HINT;

impl App {
    /// Called on every tick of the event loop.
    ///
    /// Expires transient status messages back to the resting text.
    pub fn on_tick(&mut self) {
        if let Some(set_at) = self.status_set_at
            && set_at.elapsed() >= self.status_ttl
        {
            self.status_set_at = None;
            self.status_message = self.resting_status();
        }
        self.enforce_session();
    }

    /// How often the event loop should call `on_tick`.
    pub fn tick_rate(&self) -> Duration {
        self.tick_rate
    }

    fn resting_status(&self) -> String {
        match self.session.current_user() {
            Some(user) => format!("Signed in as: {}", user.email),
            None => String::from(SIGNED_OUT_HINT),
        }
    }
}
