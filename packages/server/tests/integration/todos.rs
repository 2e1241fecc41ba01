use serde_json::json;

use crate::common::{Bindings, TestApp, routes};

#[tokio::test]
async fn created_todos_start_incomplete() {
    let app = TestApp::spawn().await;
    let todo = app.create_todo("  Water the plants ").await;
    assert_eq!(todo["text"], "Water the plants");
    assert_eq!(todo["completed"], false);

    let res = app.call(routes::TODOS_GET).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, json!([todo]));
}

#[tokio::test]
async fn empty_text_is_rejected() {
    let app = TestApp::spawn().await;
    let res = app
        .call_with(routes::TODOS_CREATE, &json!({ "text": "   " }))
        .await;
    res.assert_error(400, "BAD_REQUEST");
}

#[tokio::test]
async fn update_changes_only_given_fields() {
    let app = TestApp::spawn().await;
    let todo = app.create_todo("Write tests").await;

    let res = app
        .call_with(
            routes::TODOS_UPDATE,
            &json!({ "id": todo["id"], "completed": true }),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["completed"], true);
    assert_eq!(res.body["text"], "Write tests");

    let res = app
        .call_with(
            routes::TODOS_UPDATE,
            &json!({ "id": todo["id"], "text": "Write more tests" }),
        )
        .await;
    assert_eq!(res.body["completed"], true);
    assert_eq!(res.body["text"], "Write more tests");
}

#[tokio::test]
async fn update_without_fields_returns_todo_unchanged() {
    let app = TestApp::spawn().await;
    let todo = app.create_todo("Stay the same").await;

    let res = app
        .call_with(routes::TODOS_UPDATE, &json!({ "id": todo["id"] }))
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, todo);
}

#[tokio::test]
async fn missing_todo_is_not_found() {
    let app = TestApp::spawn().await;

    app.call_with(routes::TODOS_UPDATE, &json!({ "id": 42, "completed": true }))
        .await
        .assert_error(404, "NOT_FOUND");
    app.call_with(routes::TODOS_DELETE, &json!({ "id": 42 }))
        .await
        .assert_error(404, "NOT_FOUND");
}

#[tokio::test]
async fn delete_returns_the_deleted_todo() {
    let app = TestApp::spawn().await;
    let keep = app.create_todo("Keep").await;
    let drop = app.create_todo("Drop").await;

    let res = app
        .call_with(routes::TODOS_DELETE, &json!({ "id": drop["id"] }))
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, drop);

    let remaining = app.call(routes::TODOS_GET).await;
    assert_eq!(remaining.body, json!([keep]));
}

#[tokio::test]
async fn todos_without_database_are_precondition_failed() {
    let app = TestApp::spawn_with(Bindings::NONE).await;
    app.call_with(routes::TODOS_CREATE, &json!({ "text": "x" }))
        .await
        .assert_error(412, "PRECONDITION_FAILED");
}
