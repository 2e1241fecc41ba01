use axum::Json;
use axum::extract::State;
use common::contract::{CreateTodoInput, IdInput, Todo, UpdateTodoInput};
use sea_orm::*;
use tracing::instrument;

use crate::entity::todo;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::todo::{is_noop, validate_create_todo, validate_update_todo};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/rpc/todos/getTodos",
    tag = "Todos",
    operation_id = "todos.getTodos",
    summary = "List all todos",
    responses(
        (status = 200, description = "Todos ordered by id", body = Vec<Todo>),
        (status = 412, description = "Database is not configured (PRECONDITION_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, AppError> {
    let todos = todo::Entity::find()
        .order_by_asc(todo::Column::Id)
        .all(state.db()?)
        .await?;
    Ok(Json(todos.into_iter().map(Todo::from).collect()))
}

#[utoipa::path(
    post,
    path = "/rpc/todos/createTodo",
    tag = "Todos",
    operation_id = "todos.createTodo",
    summary = "Create a todo",
    request_body = CreateTodoInput,
    responses(
        (status = 200, description = "Todo created", body = Todo),
        (status = 400, description = "Empty text (BAD_REQUEST)", body = ErrorBody),
        (status = 412, description = "Database is not configured (PRECONDITION_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn create_todo(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTodoInput>,
) -> Result<Json<Todo>, AppError> {
    validate_create_todo(&payload)?;

    let new_todo = todo::ActiveModel {
        text: Set(payload.text.trim().to_string()),
        completed: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let model = new_todo.insert(state.db()?).await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/rpc/todos/updateTodo",
    tag = "Todos",
    operation_id = "todos.updateTodo",
    summary = "Update a todo's text or completion",
    description = "Fields left out are kept. An update naming no field returns the todo unchanged.",
    request_body = UpdateTodoInput,
    responses(
        (status = 200, description = "Todo updated", body = Todo),
        (status = 400, description = "Empty text (BAD_REQUEST)", body = ErrorBody),
        (status = 404, description = "Todo not found (NOT_FOUND)", body = ErrorBody),
        (status = 412, description = "Database is not configured (PRECONDITION_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id = payload.id))]
pub async fn update_todo(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateTodoInput>,
) -> Result<Json<Todo>, AppError> {
    validate_update_todo(&payload)?;
    let db = state.db()?;

    if is_noop(&payload) {
        let existing = find_todo(db, payload.id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = db.begin().await?;

    let existing = find_todo(&txn, payload.id).await?;
    let mut active: todo::ActiveModel = existing.into();

    if let Some(ref text) = payload.text {
        active.text = Set(text.trim().to_string());
    }
    if let Some(completed) = payload.completed {
        active.completed = Set(completed);
    }

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/rpc/todos/deleteTodo",
    tag = "Todos",
    operation_id = "todos.deleteTodo",
    summary = "Delete a todo",
    request_body = IdInput,
    responses(
        (status = 200, description = "The deleted todo", body = Todo),
        (status = 404, description = "Todo not found (NOT_FOUND)", body = ErrorBody),
        (status = 412, description = "Database is not configured (PRECONDITION_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id = payload.id))]
pub async fn delete_todo(
    State(state): State<AppState>,
    AppJson(payload): AppJson<IdInput>,
) -> Result<Json<Todo>, AppError> {
    let db = state.db()?;
    let existing = find_todo(db, payload.id).await?;
    todo::Entity::delete_by_id(existing.id).exec(db).await?;
    Ok(Json(existing.into()))
}

async fn find_todo<C: ConnectionTrait>(db: &C, id: i32) -> Result<todo::Model, AppError> {
    todo::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Todo {id} not found")))
}
