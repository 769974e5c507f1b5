use std::{fmt, str::FromStr};

/// Assignee name shown when a task points at a user that no longer exists.
pub const UNKNOWN_ASSIGNEE: &str = "Unknown";

const PREVIEW_LIMIT: usize = 50;
const PREVIEW_CUT: usize = 47;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: String, // "High", "Medium", "Low"
    pub assigned_to_user_id: i64,
    pub assigned_to_username: String, // resolved at read time, not stored
    pub is_complete: bool,
    pub progress: i64,
}

impl Task {
    /// "DONE" for completed tasks, otherwise the progress percentage.
    pub fn status_text(&self) -> String {
        if self.is_complete {
            "DONE".to_string()
        } else {
            format!("{}%", self.progress)
        }
    }

    /// Short form of the description for task cards.
    pub fn description_preview(&self) -> String {
        if self.description.chars().count() > PREVIEW_LIMIT {
            let head: String = self.description.chars().take(PREVIEW_CUT).collect();
            format!("{head}...")
        } else {
            self.description.clone()
        }
    }

    pub fn priority_rank(&self) -> u8 {
        priority_rank(&self.priority)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_complete {
            "[COMPLETE]"
        } else {
            "[PENDING]"
        };
        write!(
            f,
            "{} ID: {} | {} | Priority: {} | Progress: {}% | Assigned to: {}",
            status, self.id, self.title, self.priority, self.progress, self.assigned_to_username
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Literal stored in the `priority` column.
    pub fn as_sql(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Priority::High => Priority::Medium,
            Priority::Medium => Priority::Low,
            Priority::Low => Priority::High,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Priority::High => Priority::Low,
            Priority::Medium => Priority::High,
            Priority::Low => Priority::Medium,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Sort rank of a stored priority string. Case-insensitive; unrecognized values rank 0.
pub fn priority_rank(raw: &str) -> u8 {
    raw.parse::<Priority>().map_or(0, Priority::rank)
}

/// Fields supplied when creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub assigned_to_user_id: i64,
}

/// Full replacement of an existing task's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub assigned_to_user_id: i64,
    pub is_complete: bool,
    pub progress: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Task {
        Task {
            id: 1,
            title: "Test Task".to_string(),
            description: "This is a test task.".to_string(),
            priority: "High".to_string(),
            assigned_to_user_id: 42,
            assigned_to_username: "doubtfire".to_string(),
            is_complete: false,
            progress: 50,
        }
    }

    #[test]
    fn test_display_contains_all_fields() {
        let text = sample().to_string();
        assert_eq!(
            text,
            "[PENDING] ID: 1 | Test Task | Priority: High | Progress: 50% | Assigned to: doubtfire"
        );
    }

    #[test]
    fn test_display_complete_marker() {
        let mut task = sample();
        task.is_complete = true;
        assert!(task.to_string().starts_with("[COMPLETE]"));
    }

    #[test]
    fn test_status_text() {
        let mut task = sample();
        assert_eq!(task.status_text(), "50%");
        task.is_complete = true;
        assert_eq!(task.status_text(), "DONE");
    }

    #[test]
    fn test_description_preview_truncates_long_text() {
        let mut task = sample();
        task.description = "x".repeat(60);
        let preview = task.description_preview();
        assert_eq!(preview.chars().count(), 50);
        assert!(preview.ends_with("..."));

        task.description = "y".repeat(50);
        assert_eq!(task.description_preview(), task.description);
    }

    #[test]
    fn test_priority_rank_is_case_insensitive() {
        assert_eq!(priority_rank("High"), 3);
        assert_eq!(priority_rank("high"), 3);
        assert_eq!(priority_rank("MEDIUM"), 2);
        assert_eq!(priority_rank("Low"), 1);
        assert_eq!(priority_rank("Urgent"), 0);
        assert_eq!(priority_rank(""), 0);
    }

    #[test]
    fn test_priority_cycles() {
        for p in Priority::ALL {
            assert_eq!(p.next().prev(), p);
        }
        assert_eq!(Priority::Low.next(), Priority::High);
    }

    #[test]
    fn test_priority_parse_and_display() {
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::Low);
        assert!("Critical".parse::<Priority>().is_err());
        assert_eq!(Priority::Medium.to_string(), "Medium");
    }
}
