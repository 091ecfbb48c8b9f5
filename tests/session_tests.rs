mod support;

use std::sync::Arc;

use distributo_console::api::{ApiError, ConsoleApi};
use distributo_console::session::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, SessionContext, SessionManager,
};
use support::{EMAIL, Harness, PASSWORD};

#[tokio::test]
async fn login_then_restore_yields_same_user() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credential");

    let first = Harness::with_context(SessionContext::new(Arc::new(FileCredentialStore::new(
        &path,
    ))));
    let user = first.session.login(EMAIL, PASSWORD).await.unwrap();
    assert!(first.session.is_authenticated());
    assert!(path.exists());

    // A second process reading the same credential file.
    let context = SessionContext::new(Arc::new(FileCredentialStore::new(&path)));
    first.api.attach(context.clone());
    let api: Arc<dyn ConsoleApi> = first.api.clone();
    let session = SessionManager::new(context, api);

    assert!(session.restore().await);
    assert!(session.is_authenticated());
    assert_eq!(session.current_user(), Some(user));
}

#[tokio::test]
async fn wrong_password_leaves_session_signed_out() {
    let harness = Harness::new();
    let err = harness.session.login(EMAIL, "wrong-password").await.unwrap_err();
    assert_eq!(err.0, "Invalid credentials");
    assert!(!harness.session.is_authenticated());
    assert_eq!(harness.context.credential(), None);
}

#[tokio::test]
async fn login_failure_without_server_message_uses_fallback() {
    let harness = Harness::new();
    harness.api.fail_next(
        "login",
        ApiError::Network(String::from("connection refused")),
    );
    let err = harness.session.login(EMAIL, PASSWORD).await.unwrap_err();
    assert_eq!(
        err.0,
        "Login failed. Please check your credentials and try again."
    );
}

#[tokio::test]
async fn rejected_stored_credential_is_discarded() {
    let store = Arc::new(MemoryCredentialStore::with_token("stale-token"));
    let harness = Harness::with_context(SessionContext::new(store.clone()));

    assert!(!harness.session.restore().await);
    assert!(!harness.session.is_authenticated());
    assert_eq!(harness.context.credential(), None);
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn restore_without_credential_skips_backend() {
    let harness = Harness::new();
    assert!(!harness.session.restore().await);
    assert!(harness.api.calls().is_empty());
}

#[tokio::test]
async fn register_does_not_sign_in() {
    let harness = Harness::new();
    harness
        .session
        .register("new@distributo.io", "secret9")
        .await
        .unwrap();
    assert!(!harness.session.is_authenticated());
    assert_eq!(harness.context.credential(), None);

    harness
        .session
        .login("new@distributo.io", "secret9")
        .await
        .unwrap();
    assert!(harness.session.is_authenticated());
}

#[tokio::test]
async fn duplicate_registration_surfaces_server_message() {
    let harness = Harness::new();
    let err = harness.session.register(EMAIL, "secret9").await.unwrap_err();
    assert_eq!(err.0, "User already exists");
}

#[tokio::test]
async fn logout_clears_memory_and_storage() {
    let store = Arc::new(MemoryCredentialStore::new());
    let harness = Harness::with_context(SessionContext::new(store.clone()));
    harness.session.login(EMAIL, PASSWORD).await.unwrap();
    assert!(store.load().unwrap().is_some());

    harness.session.logout();
    assert!(!harness.session.is_authenticated());
    assert_eq!(harness.session.current_user(), None);
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn server_rejection_mid_session_signs_out() {
    let harness = Harness::signed_in().await;
    harness.api.revoke_all_tokens();

    let err = harness.api.list_agents().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!harness.session.is_authenticated());
    assert_eq!(harness.context.persisted_credential(), None);
}
