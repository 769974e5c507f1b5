//! Task store: CRUD over the `tasks` table and the two board orderings.

use std::cmp::Reverse;

use rusqlite::{params, Connection, Row};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::task::{Task, TaskDraft, TaskUpdate, UNKNOWN_ASSIGNEE};

const TASKS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    priority TEXT CHECK(priority IN ('High', 'Medium', 'Low')) NOT NULL,
    assigned_to_user_id INTEGER NOT NULL,
    is_complete BOOLEAN NOT NULL DEFAULT 0,
    progress INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (assigned_to_user_id) REFERENCES users(id)
);
";

pub struct TaskStore<'a> {
    conn: &'a Connection,
}

impl<'a> TaskStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(TASKS_SCHEMA)?;
        Ok(())
    }

    /// Insert a new, incomplete task at 0% progress. Returns the new id.
    pub fn create(&self, draft: &TaskDraft) -> Result<i64> {
        require_title(&draft.title)?;
        self.conn.execute(
            "INSERT INTO tasks (title, description, priority, assigned_to_user_id, is_complete, progress)
             VALUES (?1, ?2, ?3, ?4, 0, 0)",
            params![
                draft.title,
                draft.description,
                draft.priority.as_sql(),
                draft.assigned_to_user_id,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(task_id = id, "Created task {:?}", draft.title);
        Ok(id)
    }

    /// Replace every editable field of task `id`.
    ///
    /// Completion and progress are written as given; neither is derived from the other.
    pub fn edit(&self, id: i64, update: &TaskUpdate) -> Result<()> {
        require_title(&update.title)?;
        let changed = self.conn.execute(
            "UPDATE tasks
             SET title = ?1, description = ?2, priority = ?3, assigned_to_user_id = ?4,
                 is_complete = ?5, progress = ?6
             WHERE id = ?7",
            params![
                update.title,
                update.description,
                update.priority.as_sql(),
                update.assigned_to_user_id,
                update.is_complete,
                update.progress,
                id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::TaskNotFound(id));
        }
        debug!(task_id = id, "Updated task");
        Ok(())
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::TaskNotFound(id));
        }
        info!(task_id = id, "Deleted task");
        Ok(())
    }

    /// Every task in ascending id order, with assignee names resolved in the
    /// same query. Dangling assignees read as "Unknown".
    pub fn list_all(&self) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.title, t.description, t.priority, t.assigned_to_user_id,
                    COALESCE(u.username, ?1), t.is_complete, t.progress
             FROM tasks t
             LEFT JOIN users u ON u.id = t.assigned_to_user_id
             ORDER BY t.id ASC",
        )?;
        let tasks = stmt
            .query_map(params![UNKNOWN_ASSIGNEE], task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }
}

fn require_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(StoreError::Validation("title cannot be empty".to_string()));
    }
    Ok(())
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        priority: row.get(3)?,
        assigned_to_user_id: row.get(4)?,
        assigned_to_username: row.get(5)?,
        is_complete: row.get(6)?,
        progress: row.get(7)?,
    })
}

/// Highest priority first (High, Medium, Low, then anything unrecognized).
/// Stable, and returns a new vector so the input can be re-sorted by another key.
pub fn sort_by_priority(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by_key(|t| Reverse(t.priority_rank()));
    sorted
}

/// Ascending by assignee display name, ordinal comparison. Stable.
pub fn sort_by_assignee(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| a.assigned_to_username.cmp(&b.assigned_to_username));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::task::Priority;

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.ensure_schema().unwrap();
        db
    }

    fn draft(title: &str, priority: Priority, assignee: i64) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            description: "D".to_string(),
            priority,
            assigned_to_user_id: assignee,
        }
    }

    fn task(id: i64, priority: &str, assignee: &str) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            description: String::new(),
            priority: priority.to_string(),
            assigned_to_user_id: 0,
            assigned_to_username: assignee.to_string(),
            is_complete: false,
            progress: 0,
        }
    }

    fn ids(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().map(|t| t.id).collect()
    }

    // --- CRUD ---

    #[test]
    fn test_create_task_defaults() {
        let db = setup_db();
        let user = db.accounts().register("alice", "pw").unwrap();
        let id = db
            .tasks()
            .create(&draft("T", Priority::High, user.id))
            .unwrap();
        assert!(id > 0);

        let tasks = db.tasks().list_all().unwrap();
        assert_eq!(tasks.len(), 1);
        let t = &tasks[0];
        assert_eq!(t.id, id);
        assert_eq!(t.title, "T");
        assert_eq!(t.description, "D");
        assert_eq!(t.priority, "High");
        assert_eq!(t.progress, 0);
        assert!(!t.is_complete);
        assert_eq!(t.assigned_to_username, "alice");
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let db = setup_db();
        let err = db
            .tasks()
            .create(&draft("  ", Priority::Low, 1))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(db.tasks().list_all().unwrap().is_empty());
    }

    #[test]
    fn test_priority_check_constraint() {
        let db = setup_db();
        let result = db.connection().execute(
            "INSERT INTO tasks (title, priority, assigned_to_user_id) VALUES ('x', 'Urgent', 1)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_assignee_lists_as_unknown() {
        let db = setup_db();
        db.tasks().create(&draft("orphan", Priority::Low, 99)).unwrap();
        let tasks = db.tasks().list_all().unwrap();
        assert_eq!(tasks[0].assigned_to_username, UNKNOWN_ASSIGNEE);
        assert_eq!(tasks[0].assigned_to_user_id, 99);
    }

    #[test]
    fn test_null_description_reads_as_empty() {
        let db = setup_db();
        db.connection()
            .execute(
                "INSERT INTO tasks (title, priority, assigned_to_user_id) VALUES ('x', 'Low', 1)",
                [],
            )
            .unwrap();
        assert_eq!(db.tasks().list_all().unwrap()[0].description, "");
    }

    #[test]
    fn test_edit_overwrites_every_field() {
        let db = setup_db();
        let alice = db.accounts().register("alice", "pw").unwrap();
        let bob = db.accounts().register("bob", "pw").unwrap();
        let id = db
            .tasks()
            .create(&draft("T", Priority::High, alice.id))
            .unwrap();

        let update = TaskUpdate {
            title: "New".to_string(),
            description: "Changed".to_string(),
            priority: Priority::Low,
            assigned_to_user_id: bob.id,
            is_complete: true,
            progress: 10,
        };
        db.tasks().edit(id, &update).unwrap();

        let t = &db.tasks().list_all().unwrap()[0];
        assert_eq!(t.title, "New");
        assert_eq!(t.description, "Changed");
        assert_eq!(t.priority, "Low");
        assert_eq!(t.assigned_to_user_id, bob.id);
        assert_eq!(t.assigned_to_username, "bob");
        // Completion and progress stay independent.
        assert!(t.is_complete);
        assert_eq!(t.progress, 10);
    }

    #[test]
    fn test_edit_missing_task_changes_nothing() {
        let db = setup_db();
        let id = db.tasks().create(&draft("T", Priority::High, 1)).unwrap();
        let before = db.tasks().list_all().unwrap();

        let update = TaskUpdate {
            title: "X".to_string(),
            description: String::new(),
            priority: Priority::Low,
            assigned_to_user_id: 1,
            is_complete: true,
            progress: 100,
        };
        let err = db.tasks().edit(id + 1, &update).unwrap_err();
        assert!(matches!(err, StoreError::TaskNotFound(missing) if missing == id + 1));
        assert_eq!(db.tasks().list_all().unwrap(), before);
    }

    #[test]
    fn test_delete() {
        let db = setup_db();
        let keep = db.tasks().create(&draft("keep", Priority::Low, 1)).unwrap();
        let gone = db.tasks().create(&draft("gone", Priority::Low, 1)).unwrap();
        db.tasks().delete(gone).unwrap();
        assert_eq!(ids(&db.tasks().list_all().unwrap()), vec![keep]);
        assert!(matches!(
            db.tasks().delete(gone),
            Err(StoreError::TaskNotFound(_))
        ));
    }

    #[test]
    fn test_list_all_orders_by_id() {
        let db = setup_db();
        let a = db.tasks().create(&draft("a", Priority::Low, 1)).unwrap();
        let b = db.tasks().create(&draft("b", Priority::High, 1)).unwrap();
        let c = db.tasks().create(&draft("c", Priority::Medium, 1)).unwrap();
        assert_eq!(ids(&db.tasks().list_all().unwrap()), vec![a, b, c]);
    }

    // --- Sorting ---

    #[test]
    fn test_sort_by_priority() {
        let tasks = vec![task(1, "Low", ""), task(2, "High", ""), task(3, "Medium", "")];
        assert_eq!(ids(&sort_by_priority(&tasks)), vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_by_priority_is_stable_and_sinks_unknown() {
        let tasks = vec![
            task(1, "Urgent", ""),
            task(2, "high", ""),
            task(3, "Low", ""),
            task(4, "High", ""),
            task(5, "Low", ""),
        ];
        assert_eq!(ids(&sort_by_priority(&tasks)), vec![2, 4, 3, 5, 1]);
    }

    #[test]
    fn test_sort_by_assignee_is_stable() {
        let tasks = vec![task(1, "Low", "Bob"), task(2, "Low", "Alice"), task(3, "Low", "Bob")];
        let sorted = sort_by_assignee(&tasks);
        let names: Vec<_> = sorted.iter().map(|t| t.assigned_to_username.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Bob"]);
        assert_eq!(ids(&sorted), vec![2, 1, 3]);
    }

    #[test]
    fn test_sorting_leaves_input_untouched() {
        let tasks = vec![task(1, "Low", "Zed"), task(2, "High", "Amy")];
        let by_priority = sort_by_priority(&tasks);
        let by_assignee = sort_by_assignee(&tasks);
        assert_eq!(ids(&tasks), vec![1, 2]);
        assert_eq!(ids(&by_priority), vec![2, 1]);
        assert_eq!(ids(&by_assignee), vec![2, 1]);
    }
}
