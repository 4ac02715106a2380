//! Local account resolution through the router.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;
use steward_link_core::{AccountId, Domicile, Email};
use steward_link_integration_tests::{FakeSteward, TestApp, remote_account, user};
use steward_link_service::db::LocalAccountStore;
use steward_link_service::models::LocalAccount;
use steward_link_service::steward::RemoteAccount;

async fn put_message(app: &TestApp, with_user: bool) -> (StatusCode, serde_json::Value) {
    let user = user();
    app.send(
        Method::PUT,
        "/api/v1/message/7",
        with_user.then_some(&user),
        Some(&json!({"greetings": "hi"})),
    )
    .await
}

#[tokio::test]
async fn test_anonymous_caller_is_unauthorized() {
    let app = TestApp::new(true, FakeSteward::with_account(remote_account()));

    let (status, body) = put_message(&app, false).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "User is unauthorized.");
    assert!(app.steward.calls().is_empty());
}

#[tokio::test]
async fn test_first_call_creates_local_account() {
    let app = TestApp::new(true, FakeSteward::with_account(remote_account()));

    let (status, body) = put_message(&app, true).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"greetings": "7 hi"}));
    assert_eq!(app.steward.calls(), vec!["prov-1".to_owned()]);
    assert_eq!(app.store.saves(), 1);

    let account = app
        .store
        .get_by_id(AccountId::new(42))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.email().as_str(), "a@x.com");
    assert_eq!(account.identity_id(), "prov-1");
    assert_eq!(account.zone(), Some("Europe/Paris"));
    assert_eq!(account.stored_locale(), Some("fr"));

    let defaults = &app.state.config().defaults;
    assert_eq!(account.locale(defaults).as_str(), "fr");
    assert_eq!(account.domicile(defaults).unwrap(), Domicile::Cz);
}

#[tokio::test]
async fn test_second_call_uses_stored_account() {
    let app = TestApp::new(true, FakeSteward::with_account(remote_account()));

    put_message(&app, true).await;
    let (status, _) = put_message(&app, true).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.steward.calls().len(), 1);
    assert_eq!(app.store.saves(), 1);
}

#[tokio::test]
async fn test_existing_account_skips_steward() {
    let app = TestApp::new(true, FakeSteward::empty());
    let existing = LocalAccount::from_remote(remote_account()).unwrap();
    app.store.save(&existing).await.unwrap();

    let (status, _) = put_message(&app, true).await;

    assert_eq!(status, StatusCode::OK);
    assert!(app.steward.calls().is_empty());
    assert_eq!(app.store.saves(), 1);
}

#[tokio::test]
async fn test_unknown_remote_account_is_not_found() {
    let app = TestApp::new(true, FakeSteward::empty());

    let (status, body) = put_message(&app, true).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"]["message"],
        "Account not found for Identity ID prov-1"
    );
    assert_eq!(app.store.saves(), 0);
}

#[tokio::test]
async fn test_steward_failure_is_try_again_later() {
    let app = TestApp::new(true, FakeSteward::failing(503));

    let (status, body) = put_message(&app, true).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": {"code": 500, "message": "Try again later"}})
    );
    assert_eq!(app.steward.calls().len(), 1);
    assert_eq!(app.store.saves(), 0);
}

#[tokio::test]
async fn test_remote_account_without_identity_is_not_stored() {
    let remote = RemoteAccount {
        identity_id: String::new(),
        ..remote_account()
    };
    let app = TestApp::new(true, FakeSteward::with_account(remote));

    let (status, body) = put_message(&app, true).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], "Try again later");
    assert_eq!(app.store.saves(), 0);
}

#[tokio::test]
async fn test_provider_lookup_by_email() {
    let app = TestApp::new(true, FakeSteward::with_account(remote_account()));
    put_message(&app, true).await;

    let email = Email::parse("a@x.com").unwrap();
    let found = app.state.accounts().get_by_email(&email).await.unwrap();
    assert_eq!(found.unwrap().account_id(), Some(AccountId::new(42)));

    let by_id = app
        .state
        .accounts()
        .get_by_id(AccountId::new(42))
        .await
        .unwrap();
    assert!(by_id.is_some());
}
