/// Task lifecycle endpoints and the dashboard
///
/// # Endpoints
///
/// - `GET  /v1/tasks`: list with status/priority filters and pagination
/// - `POST /v1/tasks`: create (multipart, optional file attachments)
/// - `GET  /v1/tasks/mine`: tasks assigned to the caller
/// - `GET  /v1/tasks/:id`: task detail with attached files
/// - `POST /v1/tasks/:id/verify`: run the business-goal assessment
/// - `POST /v1/tasks/:id/submit`: draft/verified → pending
/// - `POST /v1/tasks/:id/status`: set any status code directly
/// - `GET  /v1/dashboard`: per-user counts and recent activity
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Multipart, Path, Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use clarifai_shared::{
    auth::middleware::AuthContext,
    models::{
        file::{CreateFile, StoredFile},
        task::{CreateTask, OutputType, Task, TaskFilter, TaskPriority, TaskStatus},
    },
    storage::storage_key,
    verify::Assessment,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query parameters for task listing
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    /// Filter by status code
    pub status: Option<String>,

    /// Filter by priority code
    pub priority: Option<String>,

    /// 1-based page number (default 1)
    pub page: Option<i64>,

    /// Page size (default 20, capped at 100)
    pub per_page: Option<i64>,
}

/// Paginated task listing
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub page: i64,
    pub per_page: i64,
}

/// Task detail with attached files
#[derive(Debug, Serialize)]
pub struct TaskDetailResponse {
    pub task: Task,
    pub files: Vec<StoredFile>,
}

/// Verification outcome: the assessment plus the updated task
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub assessment: Assessment,
    pub task: Task,
}

/// Dashboard summary for the calling user
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// Tasks the user created
    pub created_count: i64,

    /// Tasks assigned to the user
    pub assigned_count: i64,

    /// Assigned tasks waiting to be picked up
    pub assigned_pending_count: i64,

    /// Assigned tasks currently being worked on
    pub assigned_in_progress_count: i64,

    /// Five most recently updated tasks the user touches
    pub recent_tasks: Vec<Task>,
}

fn pagination(page: Option<i64>, per_page: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    (page, per_page, (page - 1) * per_page)
}

/// Rejects deadlines before today; today itself is accepted
fn validate_deadline(date: NaiveDate) -> Result<NaiveDate, ApiError> {
    if date < Utc::now().date_naive() {
        return Err(ApiError::invalid_field(
            "deadline",
            "Deadline cannot be in the past",
        ));
    }
    Ok(date)
}

/// Lists tasks, optionally filtered by status and priority
///
/// # Errors
///
/// - `422`: unknown status or priority code
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<TaskListResponse>> {
    let mut filter = TaskFilter::default();

    if let Some(code) = &query.status {
        filter.status = Some(
            TaskStatus::parse(code)
                .ok_or_else(|| ApiError::invalid_field("status", "Unknown status code"))?,
        );
    }
    if let Some(code) = &query.priority {
        filter.priority = Some(
            TaskPriority::parse(code)
                .ok_or_else(|| ApiError::invalid_field("priority", "Unknown priority code"))?,
        );
    }

    let (page, per_page, offset) = pagination(query.page, query.per_page);
    let tasks = Task::list(&state.db, &filter, per_page, offset).await?;

    Ok(Json(TaskListResponse {
        tasks,
        page,
        per_page,
    }))
}

/// Lists tasks assigned to the calling user
pub async fn my_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<TaskListResponse>> {
    let filter = TaskFilter {
        assignee_id: Some(auth.user_id),
        ..TaskFilter::default()
    };

    let (page, per_page, offset) = pagination(query.page, query.per_page);
    let tasks = Task::list(&state.db, &filter, per_page, offset).await?;

    Ok(Json(TaskListResponse {
        tasks,
        page,
        per_page,
    }))
}

/// Collected fields of the multipart create-task form
#[derive(Debug, Default)]
struct TaskForm {
    title: Option<String>,
    business_goal: Option<String>,
    priority: Option<String>,
    output_type: Option<String>,
    deadline: Option<String>,
    assignee_id: Option<String>,
    attachments: Vec<(String, String, bytes::Bytes)>,
}

async fn read_task_form(mut multipart: Multipart) -> ApiResult<TaskForm> {
    let mut form = TaskForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "files" {
            // Browsers send an empty part when no file was chosen.
            let original_name = field.file_name().unwrap_or_default().to_string();
            if original_name.is_empty() {
                continue;
            }
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;
            form.attachments.push((original_name, content_type, data));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read field {name}: {e}")))?;

        match name.as_str() {
            "title" => form.title = Some(value),
            "business_goal" => form.business_goal = Some(value),
            "priority" => form.priority = Some(value),
            "output_type" => form.output_type = Some(value),
            "deadline" => form.deadline = Some(value),
            "assignee_id" => form.assignee_id = Some(value),
            _ => {}
        }
    }

    Ok(form)
}

/// Creates a task from a multipart form, storing any attached files
///
/// All field validation happens before the insert, so invalid input never
/// leaves a partial task behind. Attachments are persisted to the active
/// storage backend after the task row exists and are linked to it. The
/// nil UUID as `assignee_id` means unassigned.
///
/// # Errors
///
/// - `422`: empty title, unknown enum code, past deadline, bad UUID
/// - `400`: malformed multipart body
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Multipart,
) -> ApiResult<Json<TaskDetailResponse>> {
    let form = read_task_form(multipart).await?;

    let title = form
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::invalid_field("title", "Title is required"))?
        .to_string();

    let priority = match form.priority.as_deref() {
        None | Some("") => TaskPriority::Medium,
        Some(code) => TaskPriority::parse(code)
            .ok_or_else(|| ApiError::invalid_field("priority", "Unknown priority code"))?,
    };

    let output_type = match form.output_type.as_deref() {
        None | Some("") => OutputType::Report,
        Some(code) => OutputType::parse(code)
            .ok_or_else(|| ApiError::invalid_field("output_type", "Unknown output type code"))?,
    };

    let deadline = match form.deadline.as_deref() {
        None | Some("") => None,
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                ApiError::invalid_field("deadline", "Expected a YYYY-MM-DD date")
            })?;
            Some(validate_deadline(date)?)
        }
    };

    let assignee_id = match form.assignee_id.as_deref() {
        None | Some("") => None,
        Some(raw) => {
            let id = Uuid::parse_str(raw)
                .map_err(|_| ApiError::invalid_field("assignee_id", "Expected a UUID"))?;
            if id.is_nil() {
                None
            } else {
                Some(id)
            }
        }
    };

    let business_goal = form.business_goal.filter(|g| !g.trim().is_empty());

    let task = Task::create(
        &state.db,
        CreateTask {
            title,
            business_goal,
            priority,
            output_type,
            creator_id: auth.user_id,
            assignee_id,
            deadline,
        },
    )
    .await?;

    let mut files = Vec::with_capacity(form.attachments.len());
    for (original_name, content_type, data) in form.attachments {
        let key = storage_key(&original_name);
        let size_bytes = data.len() as i64;

        let outcome = state
            .store
            .put(&key, data, &content_type)
            .await
            .map_err(|e| ApiError::InternalError(format!("Failed to store attachment: {e}")))?;

        let file = StoredFile::create(
            &state.db,
            CreateFile {
                stored_name: key,
                original_name,
                size_bytes,
                content_type,
                uploader_id: auth.user_id,
                task_id: Some(task.id),
                is_remote: outcome.is_remote,
                remote_url: outcome.remote_url,
            },
        )
        .await?;

        files.push(file);
    }

    tracing::info!(task_id = %task.id, attachments = files.len(), "Task created");

    Ok(Json(TaskDetailResponse { task, files }))
}

/// Returns one task with its attached files
pub async fn view_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskDetailResponse>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task {id} not found")))?;

    let files = StoredFile::list_by_task(&state.db, id).await?;

    Ok(Json(TaskDetailResponse { task, files }))
}

/// Runs the business-goal assessment and stores the result
///
/// Legal from any status; the previous result is overwritten and the task
/// lands in `verified`.
///
/// # Errors
///
/// - `404`: unknown task
/// - `400`: task has no business goal to assess
pub async fn verify_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<VerifyResponse>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task {id} not found")))?;

    let goal = task.business_goal.as_deref().unwrap_or("");
    let assessment = state.verifier.assess(&task.title, goal).await?;

    let task = Task::set_verification(&state.db, id, &assessment.as_result_text())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task {id} not found")))?;

    Ok(Json(VerifyResponse { assessment, task }))
}

/// Submits a task: `draft`/`verified` → `pending`
///
/// # Errors
///
/// - `404`: unknown task
/// - `409`: task is not in a submittable status
pub async fn submit_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    if let Some(task) = Task::submit(&state.db, id).await? {
        return Ok(Json(task));
    }

    // The conditional update matched nothing: tell an unknown id apart
    // from a task in the wrong status.
    match Task::find_by_id(&state.db, id).await? {
        Some(task) => Err(ApiError::Conflict(format!(
            "Task in status '{}' cannot be submitted",
            task.status
        ))),
        None => Err(ApiError::NotFound(format!("Task {id} not found"))),
    }
}

/// Request body for the direct status update
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// New status code
    pub status: String,
}

/// Sets a task's status directly
///
/// Accepts any of the six codes from any current state. Reaching
/// `completed` stamps `completed_at` once.
///
/// # Errors
///
/// - `422`: unknown status code
/// - `404`: unknown task
pub async fn update_task_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Task>> {
    let status = TaskStatus::parse(&req.status)
        .ok_or_else(|| ApiError::invalid_field("status", "Unknown status code"))?;

    let task = Task::set_status(&state.db, id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task {id} not found")))?;

    Ok(Json(task))
}

/// Per-user dashboard: counts plus the five most recent tasks
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DashboardResponse>> {
    let created_count = Task::count_created_by(&state.db, auth.user_id).await?;
    let assigned_count = Task::count_assigned_to(&state.db, auth.user_id, None).await?;
    let assigned_pending_count =
        Task::count_assigned_to(&state.db, auth.user_id, Some(TaskStatus::Pending)).await?;
    let assigned_in_progress_count =
        Task::count_assigned_to(&state.db, auth.user_id, Some(TaskStatus::InProgress)).await?;
    let recent_tasks = Task::recent_for_user(&state.db, auth.user_id).await?;

    Ok(Json(DashboardResponse {
        created_count,
        assigned_count,
        assigned_pending_count,
        assigned_in_progress_count,
        recent_tasks,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        assert_eq!(pagination(None, None), (1, 20, 0));
    }

    #[test]
    fn test_pagination_offset() {
        assert_eq!(pagination(Some(3), Some(10)), (3, 10, 20));
    }

    #[test]
    fn test_pagination_clamps() {
        assert_eq!(pagination(Some(0), Some(0)), (1, 1, 0));
        assert_eq!(pagination(Some(-5), Some(1000)), (1, 100, 0));
    }

    #[test]
    fn test_deadline_in_past_rejected() {
        let yesterday = Utc::now().date_naive() - chrono::Duration::days(1);
        assert!(matches!(
            validate_deadline(yesterday),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn test_deadline_today_accepted() {
        let today = Utc::now().date_naive();
        assert_eq!(validate_deadline(today).unwrap(), today);
    }

    #[test]
    fn test_deadline_in_future_accepted() {
        let tomorrow = Utc::now().date_naive() + chrono::Duration::days(1);
        assert_eq!(validate_deadline(tomorrow).unwrap(), tomorrow);
    }
}
