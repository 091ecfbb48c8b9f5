use crossterm::event::KeyEvent;

/// Events the console loop reacts to.
#[derive(Debug)]
pub enum Event {
    /// Periodic tick used to expire status messages.
    Tick,
    Key(KeyEvent),
    /// The terminal changed size; the next frame re-lays out.
    Resize,
}
