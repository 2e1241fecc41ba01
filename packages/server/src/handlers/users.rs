use axum::Json;
use axum::extract::State;
use common::contract::{CreateUserInput, IdInput, UpdateUserInput, User};
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::user::{validate_create_user, validate_update_user};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/rpc/users/getUsers",
    tag = "Users",
    operation_id = "users.getUsers",
    summary = "List all users",
    responses(
        (status = 200, description = "Users ordered by id", body = Vec<User>),
        (status = 412, description = "Database is not configured (PRECONDITION_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(state.db()?)
        .await?;
    Ok(Json(users.into_iter().map(User::from).collect()))
}

#[utoipa::path(
    post,
    path = "/rpc/users/createUser",
    tag = "Users",
    operation_id = "users.createUser",
    summary = "Create a user",
    request_body = CreateUserInput,
    responses(
        (status = 200, description = "User created", body = User),
        (status = 400, description = "Invalid name or email (BAD_REQUEST)", body = ErrorBody),
        (status = 409, description = "Email already in use (CONFLICT)", body = ErrorBody),
        (status = 412, description = "Database is not configured (PRECONDITION_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserInput>,
) -> Result<Json<User>, AppError> {
    validate_create_user(&payload)?;
    let db = state.db()?;

    ensure_email_available(db, &payload.email, None).await?;

    let new_user = user::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        email: Set(payload.email.clone()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let model = new_user
        .insert(db)
        .await
        .map_err(|e| map_unique_violation(e, &payload.email))?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/rpc/users/updateUser",
    tag = "Users",
    operation_id = "users.updateUser",
    summary = "Update a user's name or email",
    request_body = UpdateUserInput,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "No fields given or invalid values (BAD_REQUEST)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Email already in use (CONFLICT)", body = ErrorBody),
        (status = 412, description = "Database is not configured (PRECONDITION_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id = payload.id))]
pub async fn update_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateUserInput>,
) -> Result<Json<User>, AppError> {
    validate_update_user(&payload)?;
    let db = state.db()?;

    let txn = db.begin().await?;

    let existing = find_user(&txn, payload.id).await?;
    if let Some(ref email) = payload.email
        && *email != existing.email
    {
        ensure_email_available(&txn, email, Some(existing.id)).await?;
    }

    let mut active: user::ActiveModel = existing.into();
    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(ref email) = payload.email {
        active.email = Set(email.clone());
    }

    let model = active.update(&txn).await.map_err(|e| {
        map_unique_violation(e, payload.email.as_deref().unwrap_or_default())
    })?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/rpc/users/deleteUser",
    tag = "Users",
    operation_id = "users.deleteUser",
    summary = "Delete a user",
    request_body = IdInput,
    responses(
        (status = 200, description = "The deleted user", body = User),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 412, description = "Database is not configured (PRECONDITION_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id = payload.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<IdInput>,
) -> Result<Json<User>, AppError> {
    let db = state.db()?;
    let existing = find_user(db, payload.id).await?;
    user::Entity::delete_by_id(existing.id).exec(db).await?;
    Ok(Json(existing.into()))
}

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
}

async fn ensure_email_available<C: ConnectionTrait>(
    db: &C,
    email: &str,
    except_id: Option<i32>,
) -> Result<(), AppError> {
    let mut query = user::Entity::find().filter(user::Column::Email.eq(email));
    if let Some(id) = except_id {
        query = query.filter(user::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(email_taken(email));
    }
    Ok(())
}

/// Two concurrent writers can both pass the lookup; the unique index decides.
fn map_unique_violation(err: DbErr, email: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Email race caught by unique constraint");
            email_taken(email)
        }
        _ => AppError::from(err),
    }
}

fn email_taken(email: &str) -> AppError {
    AppError::Conflict(format!("Email '{email}' is already in use"))
}
