use std::net::SocketAddr;

use reqwest::Client;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use server::config::{
    AppConfig, CorsConfig, DatabaseConfig, FilesystemStorageConfig, KvConfig, ServerConfig,
    StorageConfig,
};
use server::state::AppState;

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const MAX_OBJECT_SIZE: u64 = 64 * 1024;

pub mod routes {
    pub use ::common::procedures::*;

    pub fn object(key: &str) -> String {
        format!("{LOCAL_OBJECTS}/{key}")
    }
}

/// Which bindings a test server is started with.
#[derive(Clone, Copy)]
pub struct Bindings {
    pub database: bool,
    pub kv: bool,
    pub storage: bool,
}

impl Bindings {
    pub const ALL: Self = Self {
        database: true,
        kv: true,
        storage: true,
    };
    pub const NONE: Self = Self {
        database: false,
        kv: false,
        storage: false,
    };
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: Option<DatabaseConnection>,
    /// Root of the local object store. Removed when the app is dropped.
    pub storage_dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    /// Spawn a server with an in-memory database, a KV namespace and a
    /// temp-dir object store.
    pub async fn spawn() -> Self {
        Self::spawn_with(Bindings::ALL).await
    }

    pub async fn spawn_with(bindings: Bindings) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();
        let storage_dir = tempfile::tempdir().expect("Failed to create storage dir");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: addr.port(),
                cors: CorsConfig {
                    allow_origins: vec!["http://localhost:3000".to_string()],
                    max_age: 3600,
                },
            },
            database: bindings.database.then(|| DatabaseConfig {
                url: "sqlite::memory:".to_string(),
            }),
            kv: bindings.kv.then(|| KvConfig {
                namespace: "nn-stack-kv-test".to_string(),
            }),
            storage: StorageConfig {
                max_object_size: MAX_OBJECT_SIZE,
                filesystem: bindings.storage.then(|| FilesystemStorageConfig {
                    root: storage_dir.path().to_path_buf(),
                    public_base_url: format!("http://{addr}"),
                    signing_secret: SIGNING_SECRET.to_string(),
                }),
                ..Default::default()
            },
        };

        let state = AppState::init(app_config)
            .await
            .expect("Failed to initialize app state");
        let db = state.db.clone();
        let app = server::build_router(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            storage_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Call a procedure that takes no input.
    pub async fn call(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    /// Call a procedure with a JSON input.
    pub async fn call_with(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    /// PUT raw bytes to an absolute URL, as a browser would to a presigned URL.
    pub async fn put_bytes(&self, url: &str, content_type: &str, bytes: Vec<u8>) -> TestResponse {
        let res = self
            .client
            .put(url)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn create_user(&self, name: &str, email: &str) -> Value {
        let res = self
            .call_with(
                routes::USERS_CREATE,
                &serde_json::json!({ "name": name, "email": email }),
            )
            .await;
        assert_eq!(res.status, 200, "create_user failed: {}", res.text);
        res.body
    }

    pub async fn create_todo(&self, text: &str) -> Value {
        let res = self
            .call_with(routes::TODOS_CREATE, &serde_json::json!({ "text": text }))
            .await;
        assert_eq!(res.status, 200, "create_todo failed: {}", res.text);
        res.body
    }

    /// Presign a single upload and return `(url, key)`.
    pub async fn presign_one(&self, filename: &str, content_type: &str) -> (String, String) {
        let res = self
            .call_with(
                routes::STORAGE_PRESIGN,
                &serde_json::json!([{ "filename": filename, "contentType": content_type }]),
            )
            .await;
        assert_eq!(res.status, 200, "presign failed: {}", res.text);
        let entry = &res.body[0];
        (
            entry["url"].as_str().unwrap().to_string(),
            entry["key"].as_str().unwrap().to_string(),
        )
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    /// Assert a structured error response with the given status and code.
    pub fn assert_error(&self, status: u16, code: &str) {
        assert_eq!(self.status, status, "unexpected status, body: {}", self.text);
        assert_eq!(self.body["code"], code, "unexpected code, body: {}", self.text);
        assert!(
            self.body["message"].is_string(),
            "error body has no message: {}",
            self.text
        );
    }
}
