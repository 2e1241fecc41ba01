use crate::common::{Bindings, TestApp, routes};

#[tokio::test]
async fn root_greets() {
    let app = TestApp::spawn().await;
    let res = app.get("/").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.text, "Hello nn stack server!");
}

#[tokio::test]
async fn connection_is_ok_without_bindings() {
    let app = TestApp::spawn_with(Bindings::NONE).await;
    let res = app.call(routes::HEALTH_CONNECTION).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, "OK");
}

#[tokio::test]
async fn bound_resources_report_ok() {
    let app = TestApp::spawn().await;
    for path in [routes::HEALTH_KV, routes::HEALTH_DB, routes::HEALTH_R2] {
        let res = app.call(path).await;
        assert_eq!(res.status, 200, "{path}: {}", res.text);
        assert_eq!(res.body, "OK");
    }
}

#[tokio::test]
async fn missing_kv_and_db_are_not_found() {
    let app = TestApp::spawn_with(Bindings::NONE).await;
    app.call(routes::HEALTH_KV).await.assert_error(404, "NOT_FOUND");
    app.call(routes::HEALTH_DB).await.assert_error(404, "NOT_FOUND");
}

#[tokio::test]
async fn missing_storage_is_precondition_failed() {
    let app = TestApp::spawn_with(Bindings::NONE).await;
    let res = app.call(routes::HEALTH_R2).await;
    res.assert_error(412, "PRECONDITION_FAILED");
    assert_eq!(res.body["message"], "R2 Storage is not configured on the server.");
}

#[tokio::test]
async fn planets_are_listed_in_order() {
    let app = TestApp::spawn_with(Bindings::NONE).await;
    let res = app.call(routes::PLANET_LIST).await;
    assert_eq!(res.status, 200);
    let planets = res.body.as_array().unwrap();
    assert_eq!(planets.len(), 8);
    assert_eq!(planets[0]["name"], "Mercury");
    assert_eq!(planets[4]["type"], "Gas Giant");
    assert_eq!(planets[7]["distanceAu"], 30.05);
}

#[tokio::test]
async fn openapi_document_lists_procedures() {
    let app = TestApp::spawn_with(Bindings::NONE).await;
    let res = app.get("/api-docs/openapi.json").await;
    assert_eq!(res.status, 200);
    let paths = res.body["paths"].as_object().unwrap();
    assert!(paths.contains_key(routes::STORAGE_PRESIGN));
    assert!(paths.contains_key(routes::USERS_CREATE));
    assert!(paths[routes::TODOS_DELETE]["post"].is_object());
}

#[tokio::test]
async fn openapi_documents_health_outcomes() {
    let app = TestApp::spawn_with(Bindings::NONE).await;
    let res = app.get("/api-docs/openapi.json").await;
    let paths = &res.body["paths"];

    for (path, failure) in [
        (routes::HEALTH_KV, "404"),
        (routes::HEALTH_DB, "404"),
        (routes::HEALTH_R2, "412"),
    ] {
        let responses = &paths[path]["post"]["responses"];
        assert!(responses["200"].is_object(), "{path} lacks a 200 response");
        assert!(responses[failure].is_object(), "{path} lacks a {failure} response");
    }
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let app = TestApp::spawn().await;
    let res = app
        .client
        .request(reqwest::Method::OPTIONS, app.url(routes::STORAGE_LIST))
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();

    assert!(res.status().is_success());
    assert_eq!(
        res.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );
}
