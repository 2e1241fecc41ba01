//! Request and response types shared by the server and its clients.
//!
//! Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Input of `users.createUser`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateUserInput {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
}

/// Input of `users.updateUser`. At least one of `name` or `email` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserInput {
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Input of procedures addressing a single row by id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct IdInput {
    #[schema(example = 1)]
    pub id: i32,
}

/// A todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i32,
    #[schema(example = "Water the plants")]
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Input of `todos.createTodo`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTodoInput {
    #[schema(example = "Water the plants")]
    pub text: String,
}

/// Input of `todos.updateTodo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdateTodoInput {
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// A planet of the solar system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Planet {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub distance_au: f64,
}

/// One entry of a `storage.presign` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    #[schema(example = "cat.png")]
    pub filename: String,
    #[schema(example = "image/png")]
    pub content_type: String,
}

/// A presigned destination for a single direct-to-storage PUT.
///
/// `storage.presign` answers with one entry per request entry, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PresignedUpload {
    pub url: String,
    #[schema(example = "1718000000000-0b7c2f4e-6d0a-4c59-9a43-2f3c1e8f5a10")]
    pub key: String,
    #[schema(example = "cat.png")]
    pub filename: String,
}

/// An object held by the storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    /// Public URL, or `null` when no public domain is configured.
    pub url: Option<String>,
}

/// Input of `storage.delete`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteObjectInput {
    pub key: String,
}

/// Output of `storage.delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeleteObjectOutput {
    pub success: bool,
}
