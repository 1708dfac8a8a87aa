// rest/routes/tasks.rs — Task CRUD routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ApiError;
use crate::rest::extract::{ApiJson, ApiQuery};
use crate::AppContext;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub status: Option<String>,
}

pub async fn create_task(
    State(ctx): State<Arc<AppContext>>,
    ApiJson(body): ApiJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let task = ctx
        .tasks
        .create(body.title.as_deref(), body.status.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Task created successfully",
            "data": task,
        })),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_tasks(
    State(ctx): State<Arc<AppContext>>,
    ApiQuery(query): ApiQuery<ListTasksQuery>,
) -> Result<Json<Value>, ApiError> {
    let (tasks, pagination) = ctx
        .tasks
        .list(query.status.as_deref(), query.page, query.limit)
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": tasks.len(),
        "pagination": pagination,
        "data": tasks,
    })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: Option<String>,
}

pub async fn update_task_status(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateTaskStatusRequest>,
) -> Result<Json<Value>, ApiError> {
    // A missing status field fails the same enum check as a bad value.
    let status = body.status.as_deref().unwrap_or_default();
    let task = ctx.tasks.update_status(&id, status).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Task status updated successfully",
        "data": task,
    })))
}

pub async fn delete_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let task = ctx.tasks.delete(&id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Task deleted successfully",
        "data": task,
    })))
}
