use serde_json::json;

use crate::common::{Bindings, TestApp, routes};

mod user_creation {
    use super::*;

    #[tokio::test]
    async fn creates_and_lists_users() {
        let app = TestApp::spawn().await;
        let ada = app.create_user("Ada Lovelace", "ada@example.com").await;
        assert_eq!(ada["name"], "Ada Lovelace");
        assert_eq!(ada["email"], "ada@example.com");
        assert!(ada["id"].is_i64());
        assert!(ada["createdAt"].is_string());

        app.create_user("Grace Hopper", "grace@example.com").await;

        let res = app.call(routes::USERS_GET).await;
        assert_eq!(res.status, 200);
        let users = res.body.as_array().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0]["email"], "ada@example.com");
        assert_eq!(users[1]["email"], "grace@example.com");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let app = TestApp::spawn().await;
        app.create_user("Ada", "ada@example.com").await;

        let res = app
            .call_with(
                routes::USERS_CREATE,
                &json!({ "name": "Someone Else", "email": "ada@example.com" }),
            )
            .await;
        res.assert_error(409, "CONFLICT");

        let users = app.call(routes::USERS_GET).await;
        assert_eq!(users.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .call_with(
                routes::USERS_CREATE,
                &json!({ "name": "Ada", "email": "not-an-email" }),
            )
            .await;
        res.assert_error(400, "BAD_REQUEST");
    }

    #[tokio::test]
    async fn malformed_input_is_bad_request() {
        let app = TestApp::spawn().await;
        let res = app
            .call_with(routes::USERS_CREATE, &json!({ "name": "Ada" }))
            .await;
        res.assert_error(400, "BAD_REQUEST");
    }
}

mod user_update {
    use super::*;

    #[tokio::test]
    async fn renames_a_user() {
        let app = TestApp::spawn().await;
        let ada = app.create_user("Ada", "ada@example.com").await;

        let res = app
            .call_with(
                routes::USERS_UPDATE,
                &json!({ "id": ada["id"], "name": "Ada Lovelace" }),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Ada Lovelace");
        assert_eq!(res.body["email"], "ada@example.com");
        assert_eq!(res.body["createdAt"], ada["createdAt"]);
    }

    #[tokio::test]
    async fn empty_update_is_bad_request() {
        let app = TestApp::spawn().await;
        let ada = app.create_user("Ada", "ada@example.com").await;

        let res = app
            .call_with(routes::USERS_UPDATE, &json!({ "id": ada["id"] }))
            .await;
        res.assert_error(400, "BAD_REQUEST");
    }

    #[tokio::test]
    async fn email_collision_conflicts() {
        let app = TestApp::spawn().await;
        app.create_user("Ada", "ada@example.com").await;
        let grace = app.create_user("Grace", "grace@example.com").await;

        let res = app
            .call_with(
                routes::USERS_UPDATE,
                &json!({ "id": grace["id"], "email": "ada@example.com" }),
            )
            .await;
        res.assert_error(409, "CONFLICT");
    }

    #[tokio::test]
    async fn keeping_own_email_is_allowed() {
        let app = TestApp::spawn().await;
        let ada = app.create_user("Ada", "ada@example.com").await;

        let res = app
            .call_with(
                routes::USERS_UPDATE,
                &json!({ "id": ada["id"], "email": "ada@example.com", "name": "A. L." }),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app
            .call_with(routes::USERS_UPDATE, &json!({ "id": 999, "name": "Nobody" }))
            .await;
        res.assert_error(404, "NOT_FOUND");
    }
}

mod user_deletion {
    use super::*;

    #[tokio::test]
    async fn returns_the_deleted_user() {
        let app = TestApp::spawn().await;
        let ada = app.create_user("Ada", "ada@example.com").await;

        let res = app
            .call_with(routes::USERS_DELETE, &json!({ "id": ada["id"] }))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body, ada);

        let again = app
            .call_with(routes::USERS_DELETE, &json!({ "id": ada["id"] }))
            .await;
        again.assert_error(404, "NOT_FOUND");

        // The address is free again.
        app.create_user("Ada", "ada@example.com").await;
    }
}

#[tokio::test]
async fn users_without_database_are_precondition_failed() {
    let app = TestApp::spawn_with(Bindings::NONE).await;
    let res = app.call(routes::USERS_GET).await;
    res.assert_error(412, "PRECONDITION_FAILED");
    assert_eq!(res.body["message"], "Database is not configured on the server.");
}
