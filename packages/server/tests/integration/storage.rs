use ::common::ObjectKey;
use serde_json::json;

use crate::common::{Bindings, TestApp, routes};

#[tokio::test]
async fn presign_answers_in_request_order() {
    let app = TestApp::spawn().await;
    let res = app
        .call_with(
            routes::STORAGE_PRESIGN,
            &json!([
                { "filename": "a.png", "contentType": "image/png" },
                { "filename": "a.png", "contentType": "image/png" },
                { "filename": "report.pdf", "contentType": "application/pdf" },
            ]),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let entries = res.body.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["filename"], "a.png");
    assert_eq!(entries[1]["filename"], "a.png");
    assert_eq!(entries[2]["filename"], "report.pdf");

    let keys: Vec<&str> = entries.iter().map(|e| e["key"].as_str().unwrap()).collect();
    for key in &keys {
        assert!(ObjectKey::parse(key).is_ok(), "malformed key {key}");
    }
    assert_ne!(keys[0], keys[1]);

    let url = entries[2]["url"].as_str().unwrap();
    assert!(url.starts_with(&app.url(&routes::object(keys[2]))));
    assert!(url.contains("expires=") && url.contains("signature="));
}

#[tokio::test]
async fn presign_of_nothing_is_empty() {
    let app = TestApp::spawn().await;
    let res = app.call_with(routes::STORAGE_PRESIGN, &json!([])).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, json!([]));
}

#[tokio::test]
async fn uploaded_objects_are_listed_and_deleted() {
    let app = TestApp::spawn().await;
    let (url, key) = app.presign_one("cat.png", "image/png").await;
    let put = app.put_bytes(&url, "image/png", vec![7u8; 1234]).await;
    assert_eq!(put.status, 200, "{}", put.text);

    let list = app.call(routes::STORAGE_LIST).await;
    assert_eq!(list.status, 200);
    let objects = list.body.as_array().unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0]["key"], key.as_str());
    assert_eq!(objects[0]["size"], 1234);
    assert!(objects[0]["uploadedAt"].is_string());
    assert_eq!(
        objects[0]["url"],
        app.url(&routes::object(&key)).as_str()
    );

    let res = app
        .call_with(routes::STORAGE_DELETE, &json!({ "key": key }))
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, json!({ "success": true }));

    let list = app.call(routes::STORAGE_LIST).await;
    assert_eq!(list.body, json!([]));
}

#[tokio::test]
async fn deleting_an_absent_object_succeeds() {
    let app = TestApp::spawn().await;
    let key = ObjectKey::generate();
    let res = app
        .call_with(routes::STORAGE_DELETE, &json!({ "key": key }))
        .await;
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn malformed_key_is_bad_request() {
    let app = TestApp::spawn().await;
    let res = app
        .call_with(routes::STORAGE_DELETE, &json!({ "key": "../config.toml" }))
        .await;
    res.assert_error(400, "BAD_REQUEST");
}

#[tokio::test]
async fn storage_without_binding_is_precondition_failed() {
    let app = TestApp::spawn_with(Bindings::NONE).await;

    let presign = app
        .call_with(
            routes::STORAGE_PRESIGN,
            &json!([{ "filename": "a.png", "contentType": "image/png" }]),
        )
        .await;
    presign.assert_error(412, "PRECONDITION_FAILED");
    assert_eq!(
        presign.body["message"],
        "R2 Storage is not configured on the server."
    );

    app.call(routes::STORAGE_LIST)
        .await
        .assert_error(412, "PRECONDITION_FAILED");
    app.call_with(
        routes::STORAGE_DELETE,
        &json!({ "key": ObjectKey::generate() }),
    )
    .await
    .assert_error(412, "PRECONDITION_FAILED");
}
