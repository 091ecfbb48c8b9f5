//! Which row actions each batch status offers.

use crate::api::models::BatchStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    ViewDetails,
    Complete,
    Archive,
    Delete,
}

impl BatchAction {
    pub fn label(&self) -> &'static str {
        match self {
            BatchAction::ViewDetails => "View details",
            BatchAction::Complete => "Mark as completed",
            BatchAction::Archive => "Archive",
            BatchAction::Delete => "Delete",
        }
    }

    /// Status requested by a transition action.
    pub fn target_status(&self) -> Option<BatchStatus> {
        match self {
            BatchAction::Complete => Some(BatchStatus::Completed),
            BatchAction::Archive => Some(BatchStatus::Archived),
            BatchAction::ViewDetails | BatchAction::Delete => None,
        }
    }
}

/// Row menu for a batch in `status`. Details are always offered.
pub fn actions(status: BatchStatus) -> Vec<BatchAction> {
    let mut offered = vec![BatchAction::ViewDetails];
    match status {
        BatchStatus::Active => {
            offered.push(BatchAction::Complete);
            offered.push(BatchAction::Archive);
        }
        BatchStatus::Completed => {
            offered.push(BatchAction::Archive);
            offered.push(BatchAction::Delete);
        }
        BatchStatus::Pending | BatchStatus::Archived | BatchStatus::Cancelled => {
            offered.push(BatchAction::Delete);
        }
    }
    offered
}

/// Deleting is refused while a batch is active.
pub fn can_delete(status: BatchStatus) -> bool {
    status != BatchStatus::Active
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_offered_iff_not_active() {
        for status in BatchStatus::ALL {
            let offered = actions(status).contains(&BatchAction::Delete);
            assert_eq!(offered, can_delete(status), "status {status}");
            assert_eq!(offered, status != BatchStatus::Active);
        }
    }

    #[test]
    fn only_active_batches_can_be_completed() {
        for status in BatchStatus::ALL {
            let offered = actions(status).contains(&BatchAction::Complete);
            assert_eq!(offered, status == BatchStatus::Active);
        }
    }

    #[test]
    fn archive_offered_for_active_and_completed() {
        assert!(actions(BatchStatus::Active).contains(&BatchAction::Archive));
        assert!(actions(BatchStatus::Completed).contains(&BatchAction::Archive));
        assert!(!actions(BatchStatus::Archived).contains(&BatchAction::Archive));
        assert!(!actions(BatchStatus::Cancelled).contains(&BatchAction::Archive));
    }

    #[test]
    fn details_always_first() {
        for status in BatchStatus::ALL {
            assert_eq!(actions(status)[0], BatchAction::ViewDetails);
        }
    }
}
