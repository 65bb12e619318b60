/// Task model and lifecycle operations
///
/// Tasks are the primary work item of the system. Their lifecycle:
///
/// ```text
/// draft → verified → pending → in_progress → completed
///                                          → cancelled
/// ```
///
/// Only `submit` enforces a precondition (legal from `draft` or `verified`
/// exclusively). `set_status` intentionally accepts any of the six codes
/// from any current state; the original product behaves this way and the
/// asymmetry is preserved rather than fixed.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title TEXT NOT NULL,
///     business_goal TEXT,
///     priority TEXT NOT NULL DEFAULT 'medium',
///     status TEXT NOT NULL DEFAULT 'draft',
///     output_type TEXT NOT NULL DEFAULT 'report',
///     creator_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     deadline DATE,
///     verification_result TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     completed_at TIMESTAMPTZ
/// );
/// ```
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task status codes, persisted as lowercase strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Freshly created, not yet verified or submitted
    Draft,

    /// Business goal has an assessment attached
    Verified,

    /// Submitted, waiting to be picked up
    Pending,

    /// Being worked on
    InProgress,

    /// Finished (terminal)
    Completed,

    /// Abandoned (terminal)
    Cancelled,
}

impl TaskStatus {
    /// All status values, in lifecycle order
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::Draft,
        TaskStatus::Verified,
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    /// Persisted string code
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Draft => "draft",
            TaskStatus::Verified => "verified",
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a persisted code; unknown codes are rejected
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "draft" => Some(TaskStatus::Draft),
            "verified" => Some(TaskStatus::Verified),
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether a task in this status may be submitted
    ///
    /// Submission is the only transition with a precondition: it is legal
    /// exactly from `draft` and `verified`.
    pub fn can_submit(&self) -> bool {
        matches!(self, TaskStatus::Draft | TaskStatus::Verified)
    }

    /// Checks if status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

/// Task priority codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            "critical" => Some(TaskPriority::Critical),
            _ => None,
        }
    }
}

/// Desired output type of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    Report,
    Dashboard,
    Api,
    Model,
    Other,
}

impl OutputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputType::Report => "report",
            OutputType::Dashboard => "dashboard",
            OutputType::Api => "api",
            OutputType::Model => "model",
            OutputType::Other => "other",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "report" => Some(OutputType::Report),
            "dashboard" => Some(OutputType::Dashboard),
            "api" => Some(OutputType::Api),
            "model" => Some(OutputType::Model),
            "other" => Some(OutputType::Other),
            _ => None,
        }
    }
}

/// Task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Title (non-empty)
    pub title: String,

    /// Free-text business goal
    pub business_goal: Option<String>,

    /// Priority code (`low|medium|high|critical`)
    pub priority: String,

    /// Status code (`draft|verified|pending|in_progress|completed|cancelled`)
    pub status: String,

    /// Output type code (`report|dashboard|api|model|other`)
    pub output_type: String,

    /// User who created the task
    pub creator_id: Uuid,

    /// Assigned user, if any
    pub assignee_id: Option<Uuid>,

    /// Optional deadline date
    pub deadline: Option<NaiveDate>,

    /// Latest verification result text, if the task was ever verified
    pub verification_result: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Set when the task first reaches `completed`
    pub completed_at: Option<DateTime<Utc>>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub business_goal: Option<String>,
    pub priority: TaskPriority,
    pub output_type: OutputType,
    pub creator_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub deadline: Option<NaiveDate>,
}

/// Filters for task listing
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Restrict to one status
    pub status: Option<TaskStatus>,

    /// Restrict to one priority
    pub priority: Option<TaskPriority>,

    /// Restrict to tasks assigned to this user
    pub assignee_id: Option<Uuid>,
}

const TASK_COLUMNS: &str = "id, title, business_goal, priority, status, output_type, \
     creator_id, assignee_id, deadline, verification_result, \
     created_at, updated_at, completed_at";

impl Task {
    /// Creates a new task in `draft` status
    ///
    /// Input validation (non-empty title, non-past deadline, enum codes)
    /// happens at the API boundary before this is called; nothing is
    /// persisted for invalid input.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, business_goal, priority, status, output_type,
                               creator_id, assignee_id, deadline)
            VALUES ($1, $2, $3, 'draft', $4, $5, $6, $7)
            RETURNING id, title, business_goal, priority, status, output_type,
                      creator_id, assignee_id, deadline, verification_result,
                      created_at, updated_at, completed_at
            "#,
        )
        .bind(data.title)
        .bind(data.business_goal)
        .bind(data.priority.as_str())
        .bind(data.output_type.as_str())
        .bind(data.creator_id)
        .bind(data.assignee_id)
        .bind(data.deadline)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Stores a verification result and moves the task to `verified`
    ///
    /// Legal from any status; re-verifying overwrites the previous result.
    pub async fn set_verification(
        pool: &PgPool,
        id: Uuid,
        result: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = 'verified',
                verification_result = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(result)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Submits a task: `draft`/`verified` → `pending`
    ///
    /// The precondition check and the update are a single conditional
    /// statement, so a concurrent submit cannot slip through between a read
    /// and a write. Returns `None` when the task exists but is not in a
    /// submittable status (the caller reports a rejection and the status is
    /// untouched), and also when the id is unknown, which the caller
    /// distinguishes with `find_by_id`.
    pub async fn submit(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = 'pending',
                updated_at = NOW()
            WHERE id = $1 AND status IN ('draft', 'verified')
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Sets the status unconditionally
    ///
    /// Any of the six codes may be set from any current state; there is no
    /// transition-graph check here by design (see module docs). Reaching
    /// `completed` stamps `completed_at` once.
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = $2,
                completed_at = CASE
                    WHEN $2 = 'completed' AND completed_at IS NULL THEN NOW()
                    ELSE completed_at
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks matching a filter, newest first, with pagination
    pub async fn list(
        pool: &PgPool,
        filter: &TaskFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE TRUE");
        let mut bind_count = 0;

        if filter.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND status = ${}", bind_count));
        }
        if filter.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND priority = ${}", bind_count));
        }
        if filter.assignee_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND assignee_id = ${}", bind_count));
        }

        query.push_str(&format!(
            " ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            bind_count + 1,
            bind_count + 2
        ));

        let mut q = sqlx::query_as::<_, Task>(&query);

        if let Some(status) = filter.status {
            q = q.bind(status.as_str());
        }
        if let Some(priority) = filter.priority {
            q = q.bind(priority.as_str());
        }
        if let Some(assignee_id) = filter.assignee_id {
            q = q.bind(assignee_id);
        }

        let tasks = q.bind(limit).bind(offset).fetch_all(pool).await?;

        Ok(tasks)
    }

    /// Five most recently updated tasks the user created or is assigned to
    pub async fn recent_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE creator_id = $1 OR assignee_id = $1
            ORDER BY updated_at DESC
            LIMIT 5
            "#
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Counts tasks created by a user
    pub async fn count_created_by(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE creator_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Counts tasks assigned to a user, optionally in one status
    pub async fn count_assigned_to(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<TaskStatus>,
    ) -> Result<i64, sqlx::Error> {
        let count: (i64,) = match status {
            Some(status) => {
                sqlx::query_as(
                    "SELECT COUNT(*) FROM tasks WHERE assignee_id = $1 AND status = $2",
                )
                .bind(user_id)
                .bind(status.as_str())
                .fetch_one(pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE assignee_id = $1")
                    .bind(user_id)
                    .fetch_one(pool)
                    .await?
            }
        };

        Ok(count.0)
    }

    /// Deletes a task
    ///
    /// Related file rows go with it via ON DELETE CASCADE.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in TaskStatus::ALL {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_status_codes_are_exact() {
        assert_eq!(TaskStatus::Draft.as_str(), "draft");
        assert_eq!(TaskStatus::Verified.as_str(), "verified");
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
        assert_eq!(TaskStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_status_rejects_unknown_codes() {
        assert_eq!(TaskStatus::parse("review"), None);
        assert_eq!(TaskStatus::parse("DRAFT"), None);
        assert_eq!(TaskStatus::parse(""), None);
        assert_eq!(TaskStatus::parse("in-progress"), None);
    }

    #[test]
    fn test_submit_partition_is_exact() {
        // Submittable from exactly draft and verified, nothing else.
        for status in TaskStatus::ALL {
            let expected = matches!(status, TaskStatus::Draft | TaskStatus::Verified);
            assert_eq!(status.can_submit(), expected, "status {:?}", status);
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Draft.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_priority_round_trip() {
        for code in ["low", "medium", "high", "critical"] {
            assert_eq!(TaskPriority::parse(code).unwrap().as_str(), code);
        }
        assert_eq!(TaskPriority::parse("urgent"), None);
    }

    #[test]
    fn test_output_type_round_trip() {
        for code in ["report", "dashboard", "api", "model", "other"] {
            assert_eq!(OutputType::parse(code).unwrap().as_str(), code);
        }
        assert_eq!(OutputType::parse("spreadsheet"), None);
    }

    #[test]
    fn test_status_serde_codes_match_persisted_codes() {
        for status in TaskStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
