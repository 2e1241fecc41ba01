use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::contract::{
    CreateTodoInput, CreateUserInput, DeleteObjectInput, DeleteObjectOutput, IdInput, Planet,
    PresignRequest, PresignedUpload, StoredObject, Todo, UpdateTodoInput, UpdateUserInput, User,
};
use common::procedures;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::{QueryCache, QueryKey};
use crate::error::RpcError;
use crate::services::{PresignService, StorageService};

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// HTTP client for the nn-stack procedures.
///
/// With a [`QueryCache`] attached, user and todo lists are cached when fetched
/// and invalidated by every successful mutation of the same resource.
#[derive(Clone, Debug)]
pub struct RpcClient {
    client: Client,
    base_url: String,
    cache: Option<Arc<QueryCache>>,
}

impl RpcClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RpcError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<QueryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&Arc<QueryCache>> {
        self.cache.as_ref()
    }

    fn remember<T: Serialize>(&self, key: QueryKey, value: &T) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(key, value) {
                warn!(%key, "Failed to cache query result: {e}");
            }
        }
    }

    fn invalidate<T>(&self, key: QueryKey, result: Result<T, RpcError>) -> Result<T, RpcError> {
        if let (Ok(_), Some(cache)) = (&result, &self.cache) {
            cache.invalidate(key);
        }
        result
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Call a procedure that takes no input.
    pub async fn query<O: DeserializeOwned>(&self, path: &str) -> Result<O, RpcError> {
        self.send(self.client.post(self.build_url(path))).await
    }

    /// Call a procedure with a JSON input.
    pub async fn mutate<I, O>(&self, path: &str, input: &I) -> Result<O, RpcError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.send(self.client.post(self.build_url(path)).json(input))
            .await
    }

    async fn send<O: DeserializeOwned>(&self, request: RequestBuilder) -> Result<O, RpcError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorBody>(&body) {
                Ok(err) => RpcError::Procedure {
                    status: status.as_u16(),
                    code: err.code,
                    message: err.message,
                },
                Err(_) => RpcError::UnexpectedResponse {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        serde_json::from_str(&body).map_err(|e| RpcError::Decode(e.to_string()))
    }

    pub async fn health_connection(&self) -> Result<String, RpcError> {
        self.query(procedures::HEALTH_CONNECTION).await
    }

    pub async fn health_kv(&self) -> Result<String, RpcError> {
        self.query(procedures::HEALTH_KV).await
    }

    pub async fn health_db(&self) -> Result<String, RpcError> {
        self.query(procedures::HEALTH_DB).await
    }

    pub async fn health_r2(&self) -> Result<String, RpcError> {
        self.query(procedures::HEALTH_R2).await
    }

    pub async fn get_users(&self) -> Result<Vec<User>, RpcError> {
        let users: Vec<User> = self.query(procedures::USERS_GET).await?;
        self.remember(QueryKey::Users, &users);
        Ok(users)
    }

    pub async fn create_user(&self, input: &CreateUserInput) -> Result<User, RpcError> {
        let result = self.mutate(procedures::USERS_CREATE, input).await;
        self.invalidate(QueryKey::Users, result)
    }

    pub async fn update_user(&self, input: &UpdateUserInput) -> Result<User, RpcError> {
        let result = self.mutate(procedures::USERS_UPDATE, input).await;
        self.invalidate(QueryKey::Users, result)
    }

    pub async fn delete_user(&self, id: i32) -> Result<User, RpcError> {
        let result = self.mutate(procedures::USERS_DELETE, &IdInput { id }).await;
        self.invalidate(QueryKey::Users, result)
    }

    pub async fn get_todos(&self) -> Result<Vec<Todo>, RpcError> {
        let todos: Vec<Todo> = self.query(procedures::TODOS_GET).await?;
        self.remember(QueryKey::Todos, &todos);
        Ok(todos)
    }

    pub async fn create_todo(&self, text: impl Into<String>) -> Result<Todo, RpcError> {
        let input = CreateTodoInput { text: text.into() };
        let result = self.mutate(procedures::TODOS_CREATE, &input).await;
        self.invalidate(QueryKey::Todos, result)
    }

    pub async fn update_todo(&self, input: &UpdateTodoInput) -> Result<Todo, RpcError> {
        let result = self.mutate(procedures::TODOS_UPDATE, input).await;
        self.invalidate(QueryKey::Todos, result)
    }

    pub async fn delete_todo(&self, id: i32) -> Result<Todo, RpcError> {
        let result = self.mutate(procedures::TODOS_DELETE, &IdInput { id }).await;
        self.invalidate(QueryKey::Todos, result)
    }

    pub async fn list_planets(&self) -> Result<Vec<Planet>, RpcError> {
        self.query(procedures::PLANET_LIST).await
    }

    pub async fn presign_uploads(
        &self,
        files: &[PresignRequest],
    ) -> Result<Vec<PresignedUpload>, RpcError> {
        self.mutate(procedures::STORAGE_PRESIGN, files).await
    }

    pub async fn list_objects(&self) -> Result<Vec<StoredObject>, RpcError> {
        self.query(procedures::STORAGE_LIST).await
    }

    pub async fn delete_object(&self, key: &str) -> Result<DeleteObjectOutput, RpcError> {
        let input = DeleteObjectInput {
            key: key.to_string(),
        };
        self.mutate(procedures::STORAGE_DELETE, &input).await
    }
}

#[async_trait]
impl PresignService for RpcClient {
    async fn presign(&self, files: &[PresignRequest]) -> Result<Vec<PresignedUpload>, RpcError> {
        self.presign_uploads(files).await
    }
}

#[async_trait]
impl StorageService for RpcClient {
    async fn list(&self) -> Result<Vec<StoredObject>, RpcError> {
        self.list_objects().await
    }

    async fn delete(&self, key: &str) -> Result<(), RpcError> {
        self.delete_object(key).await.map(|_| ())
    }
}
