//! Two-phase confirmation for destructive actions.
//!
//! `Idle -> Confirming(target) -> Committing(target) -> Idle`. The destructive
//! request may only be issued for the target handed out by `begin_commit`.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Confirmation<T> {
    #[default]
    Idle,
    Confirming(T),
    Committing(T),
}

impl<T: Clone> Confirmation<T> {
    /// Asks the operator to confirm `target`. Ignored while a commit is in
    /// flight; replaces any previous unconfirmed target.
    pub fn request(&mut self, target: T) -> bool {
        if matches!(self, Confirmation::Committing(_)) {
            return false;
        }
        *self = Confirmation::Confirming(target);
        true
    }

    /// Drops an unconfirmed request.
    pub fn cancel(&mut self) {
        if matches!(self, Confirmation::Confirming(_)) {
            *self = Confirmation::Idle;
        }
    }

    /// Moves a confirmed request into the committing phase and returns the
    /// target to act on.
    pub fn begin_commit(&mut self) -> Option<T> {
        match self {
            Confirmation::Confirming(target) => {
                let target = target.clone();
                *self = Confirmation::Committing(target.clone());
                Some(target)
            }
            _ => None,
        }
    }

    /// The destructive call succeeded.
    pub fn complete(&mut self) {
        if matches!(self, Confirmation::Committing(_)) {
            *self = Confirmation::Idle;
        }
    }

    /// The destructive call failed; the dialog goes back to asking so the
    /// operator can retry or cancel.
    pub fn fail(&mut self) {
        if let Confirmation::Committing(target) = self {
            *self = Confirmation::Confirming(target.clone());
        }
    }

    pub fn target(&self) -> Option<&T> {
        match self {
            Confirmation::Idle => None,
            Confirmation::Confirming(target) | Confirmation::Committing(target) => Some(target),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Confirmation::Idle)
    }

    pub fn is_committing(&self) -> bool {
        matches!(self, Confirmation::Committing(_))
    }
}

/// Dialog button focus, shared by every confirmation overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmChoice {
    #[default]
    Cancel,
    Confirm,
}

impl ConfirmChoice {
    pub fn toggle(self) -> Self {
        match self {
            ConfirmChoice::Cancel => ConfirmChoice::Confirm,
            ConfirmChoice::Confirm => ConfirmChoice::Cancel,
        }
    }
}
