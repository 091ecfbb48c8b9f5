mod support;

use std::fs;
use std::path::PathBuf;

use distributo_console::api::ApiError;
use distributo_console::api::models::{BatchFilter, BatchStatus};
use distributo_console::batches::{BatchAction, BatchBoard, UploadError, actions};
use support::Harness;
use tempfile::TempDir;

fn contact_file(dir: &TempDir, name: &str, rows: usize) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, Harness::csv(rows)).unwrap();
    path
}

async fn board_with_agents(harness: &Harness, agents: usize) -> BatchBoard {
    harness.api.seed_agents(agents);
    let mut board = BatchBoard::new();
    board.refresh_agents(harness.api.as_ref()).await;
    board.refresh(harness.api.as_ref()).await;
    board
}

#[tokio::test]
async fn upload_needs_five_agents() {
    let harness = Harness::signed_in().await;
    let dir = tempfile::tempdir().unwrap();
    let path = contact_file(&dir, "contacts.csv", 12);
    let mut board = board_with_agents(&harness, 4).await;
    assert!(!board.can_upload());

    harness.api.clear_calls();
    let err = board.upload(harness.api.as_ref(), &path).await.unwrap_err();
    assert_eq!(err, UploadError::NotEnoughAgents { missing: 1 });
    assert_eq!(
        board.error(),
        Some("Please add 1 more agent(s) before uploading.")
    );
    assert!(harness.api.calls().is_empty());
    assert!(!board.is_uploading());
}

#[tokio::test]
async fn upload_distributes_and_annotates_remainder() {
    let harness = Harness::signed_in().await;
    let dir = tempfile::tempdir().unwrap();
    let path = contact_file(&dir, "contacts.csv", 12);
    let mut board = board_with_agents(&harness, 5).await;
    assert!(board.can_upload());

    board.upload(harness.api.as_ref(), &path).await.unwrap();
    assert_eq!(
        board.notice(),
        Some("File uploaded and tasks distributed successfully!")
    );
    assert_eq!(board.count(), 1);
    let batch = board.batches()[0].clone();
    assert_eq!(batch.filename.as_deref(), Some("contacts.csv"));
    assert_eq!(batch.item_count, 12);
    assert_eq!(batch.status, BatchStatus::Active);

    board.view_details(harness.api.as_ref(), &batch.batch_id).await;
    let details = board.details().unwrap();
    assert_eq!(details.items.len(), 12);
    assert_eq!(details.batch.as_ref(), Some(&batch));
    assert_eq!(
        details.distribution.note(),
        "This batch was distributed equally among 5 agents. \
         The first 2 agent(s) received one extra item."
    );
    let shares: Vec<usize> = details.distribution.shares().iter().map(|s| s.items).collect();
    assert_eq!(shares, vec![3, 3, 2, 2, 2]);
}

#[tokio::test]
async fn unsupported_extension_is_refused_locally() {
    let harness = Harness::signed_in().await;
    let dir = tempfile::tempdir().unwrap();
    let path = contact_file(&dir, "contacts.txt", 3);
    let mut board = board_with_agents(&harness, 5).await;

    harness.api.clear_calls();
    let err = board.upload(harness.api.as_ref(), &path).await.unwrap_err();
    assert!(matches!(err, UploadError::Invalid(_)));
    assert_eq!(
        board.error(),
        Some("Unsupported format. Only CSV, XLSX and XLS files are allowed")
    );
    assert!(harness.api.calls().is_empty());
}

#[tokio::test]
async fn missing_file_reports_read_error() {
    let harness = Harness::signed_in().await;
    let dir = tempfile::tempdir().unwrap();
    let mut board = board_with_agents(&harness, 5).await;

    let err = board
        .upload(harness.api.as_ref(), &dir.path().join("absent.csv"))
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Rejected(_)));
    assert_eq!(board.count(), 0);
}

#[tokio::test]
async fn upload_rejection_shows_server_message() {
    let harness = Harness::signed_in().await;
    let dir = tempfile::tempdir().unwrap();
    let path = contact_file(&dir, "contacts.csv", 4);
    let mut board = board_with_agents(&harness, 5).await;

    harness.api.fail_next(
        "upload_list",
        ApiError::Server {
            status: 400,
            message: Some(String::from("Invalid file format. Missing required columns")),
        },
    );
    let err = board.upload(harness.api.as_ref(), &path).await.unwrap_err();
    assert_eq!(
        err,
        UploadError::Rejected(String::from("Invalid file format. Missing required columns"))
    );
    assert_eq!(board.notice(), None);
}

#[tokio::test]
async fn filter_is_applied_by_server_and_idempotent() {
    let harness = Harness::signed_in().await;
    harness.api.seed_batch("a.csv", 5, BatchStatus::Active);
    harness.api.seed_batch("b.csv", 7, BatchStatus::Completed);
    harness.api.seed_batch("c.csv", 9, BatchStatus::Active);
    let mut board = board_with_agents(&harness, 5).await;
    assert_eq!(board.count(), 3);

    harness.api.clear_calls();
    let active = BatchFilter::Status(BatchStatus::Active);
    board.set_filter(harness.api.as_ref(), active).await;
    let first: Vec<String> = board.batches().iter().map(|b| b.batch_id.clone()).collect();
    board.set_filter(harness.api.as_ref(), active).await;
    let second: Vec<String> = board.batches().iter().map(|b| b.batch_id.clone()).collect();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert!(board.batches().iter().all(|b| b.status == BatchStatus::Active));
    assert_eq!(
        harness.api.calls(),
        vec![
            "GET /api/lists/batches?status=active".to_string(),
            "GET /api/lists/batches?status=active".to_string(),
        ]
    );

    board
        .set_filter(harness.api.as_ref(), BatchFilter::Status(BatchStatus::Archived))
        .await;
    assert!(board.batches().is_empty());
    assert_eq!(board.empty_message(), "No archived batches found.");
}

#[tokio::test]
async fn archiving_active_batch_drops_complete_action() {
    let harness = Harness::signed_in().await;
    let batch = harness.api.seed_batch("a.csv", 5, BatchStatus::Active);
    let mut board = board_with_agents(&harness, 5).await;
    assert!(actions(BatchStatus::Active).contains(&BatchAction::Complete));

    board.row_menu.toggle(&batch.batch_id);
    assert!(
        board
            .update_status(harness.api.as_ref(), &batch.batch_id, BatchStatus::Archived)
            .await
    );

    assert_eq!(board.row_menu.open_row, None);
    assert_eq!(board.batches()[0].status, BatchStatus::Archived);
    assert_eq!(board.notice(), Some("Batch marked as archived successfully!"));
    assert!(!actions(board.batches()[0].status).contains(&BatchAction::Complete));
    assert!(actions(board.batches()[0].status).contains(&BatchAction::Delete));
}

#[tokio::test]
async fn rejected_transition_keeps_status() {
    let harness = Harness::signed_in().await;
    let batch = harness.api.seed_batch("a.csv", 5, BatchStatus::Archived);
    let mut board = board_with_agents(&harness, 5).await;

    assert!(
        !board
            .update_status(harness.api.as_ref(), &batch.batch_id, BatchStatus::Completed)
            .await
    );
    assert_eq!(board.error(), Some("Invalid status transition"));
    assert_eq!(board.batches()[0].status, BatchStatus::Archived);
    assert_eq!(
        harness.api.batch(&batch.batch_id).map(|b| b.status),
        Some(BatchStatus::Archived)
    );
}

#[tokio::test]
async fn active_batch_cannot_be_deleted() {
    let harness = Harness::signed_in().await;
    let active = harness.api.seed_batch("a.csv", 5, BatchStatus::Active);
    let done = harness.api.seed_batch("b.csv", 5, BatchStatus::Completed);
    let mut board = board_with_agents(&harness, 5).await;

    assert!(!board.request_delete(&active));
    assert!(!board.confirm_delete(harness.api.as_ref()).await);
    assert!(harness.api.batch(&active.batch_id).is_some());

    assert!(board.request_delete(&done));
    assert!(board.confirm_delete(harness.api.as_ref()).await);
    assert_eq!(board.notice(), Some("Batch deleted successfully!"));
    assert!(harness.api.batch(&done.batch_id).is_none());
    assert_eq!(board.count(), 1);
    assert_eq!(board.batches()[0].batch_id, active.batch_id);
}

#[tokio::test]
async fn failed_batch_delete_stays_confirming() {
    let harness = Harness::signed_in().await;
    let done = harness.api.seed_batch("b.csv", 5, BatchStatus::Completed);
    let mut board = board_with_agents(&harness, 5).await;

    harness.api.fail_next(
        "delete_batch",
        ApiError::Network(String::from("connection reset")),
    );
    board.request_delete(&done);
    assert!(!board.confirm_delete(harness.api.as_ref()).await);
    assert_eq!(
        board.error(),
        Some("Failed to delete batch. Please try again later.")
    );
    assert_eq!(board.pending_delete().target(), Some(&done));
    assert!(!board.pending_delete().is_committing());
    assert!(harness.api.batch(&done.batch_id).is_some());
}

#[tokio::test]
async fn agent_items_follow_assignment() {
    let harness = Harness::signed_in().await;
    let dir = tempfile::tempdir().unwrap();
    let path = contact_file(&dir, "contacts.csv", 12);
    let mut board = board_with_agents(&harness, 6).await;
    board.upload(harness.api.as_ref(), &path).await.unwrap();

    let agents = board.agents().to_vec();
    board.view_agent_items(harness.api.as_ref(), &agents[0]).await;
    let first = board.agent_items(&agents[0].id).unwrap();
    assert_eq!(first.len(), 3);
    assert!(first.iter().all(|item| item.assignee_name() == agents[0].name));
    assert_eq!(board.selected_agent(), Some(&agents[0]));

    // The sixth agent is outside the five that share a batch.
    board.view_agent_items(harness.api.as_ref(), &agents[5]).await;
    assert_eq!(board.agent_items(&agents[5].id).map(<[_]>::len), Some(0));
}

#[tokio::test]
async fn empty_roster_blocks_agent_lists() {
    let harness = Harness::signed_in().await;
    let mut board = board_with_agents(&harness, 0).await;
    assert!(!board.check_agents_for_lists());
    assert_eq!(
        board.error(),
        Some("No agents found. Please add agents first.")
    );
}

#[tokio::test]
async fn fetch_failure_uses_fixed_message() {
    let harness = Harness::signed_in().await;
    let mut board = board_with_agents(&harness, 5).await;
    harness.api.fail_next(
        "list_batches",
        ApiError::Server {
            status: 500,
            message: Some(String::from("db down")),
        },
    );
    board.refresh(harness.api.as_ref()).await;
    assert_eq!(
        board.error(),
        Some("Failed to fetch list batches. Please try again later.")
    );
    assert!(!board.is_loading());
}

#[tokio::test]
async fn roster_failure_survives_batch_refresh() {
    let harness = Harness::signed_in().await;
    harness.api.seed_agents(6);
    harness.api.fail_next(
        "list_agents",
        ApiError::Network(String::from("connection reset")),
    );
    let mut board = BatchBoard::new();
    board.refresh_agents(harness.api.as_ref()).await;
    board.refresh(harness.api.as_ref()).await;

    assert_eq!(
        board.error(),
        Some("Failed to fetch agents. Please try again later.")
    );
    assert!(!board.agents_loaded());
    assert!(!board.can_upload());
    assert_eq!(board.check_upload(), Err(UploadError::AgentsNotLoaded));

    let dir = tempfile::tempdir().unwrap();
    let path = contact_file(&dir, "contacts.csv", 5);
    harness.api.clear_calls();
    let err = board.upload(harness.api.as_ref(), &path).await.unwrap_err();
    assert_eq!(err, UploadError::AgentsNotLoaded);
    assert!(harness.api.calls().is_empty());

    board.dismiss_error();
    board.refresh_agents(harness.api.as_ref()).await;
    assert!(board.can_upload());
    assert_eq!(board.error(), None);
}
