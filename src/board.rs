//! Presentation state for the task board.
//!
//! Everything the terminal UI shows lives here and is driven by plain method
//! calls, so screen flows are testable without a terminal. Store failures are
//! logged and collapsed into a status line.

use chrono::{DateTime, Local};
use tracing::warn;

use crate::db::Database;
use crate::task::{Priority, Task, TaskDraft, TaskUpdate, User};
use crate::task_store::{sort_by_assignee, sort_by_priority};

pub const COLUMN_COUNT: usize = 3;

const MSG_ENTER_CREDENTIALS: &str = "Enter credentials.";
const MSG_LOGIN_FAILED: &str = "Login failed: Invalid credentials.";
const MSG_REGISTER_FAILED: &str = "Registration failed (Username taken or empty).";
const MSG_FORM_INVALID: &str = "Title and assignment must be selected.";
const MSG_SAVE_FAILED: &str = "Database operation failed.";
const MSG_DELETE_FAILED: &str = "Failed to delete task.";
const MSG_LOAD_FAILED: &str = "Failed to load tasks.";

const PROGRESS_STEP: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Board,
    TaskForm,
    ConfirmDelete(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Priority,
    Assignee,
}

impl SortMode {
    pub fn label(self) -> &'static str {
        match self {
            SortMode::Priority => "priority",
            SortMode::Assignee => "assignee",
        }
    }

    fn apply(self, tasks: &[Task]) -> Vec<Task> {
        match self {
            SortMode::Priority => sort_by_priority(tasks),
            SortMode::Assignee => sort_by_assignee(tasks),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

impl StatusLine {
    fn info(text: &str) -> Self {
        Self {
            text: text.to_string(),
            is_error: false,
        }
    }

    fn error(text: &str) -> Self {
        Self {
            text: text.to_string(),
            is_error: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub focus: LoginField,
}

impl LoginForm {
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }

    pub fn insert_char(&mut self, c: char) {
        self.focused_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.focused_mut().pop();
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Priority,
    Assignee,
    Progress,
    Complete,
}

const CREATE_FIELDS: &[FormField] = &[
    FormField::Title,
    FormField::Description,
    FormField::Priority,
    FormField::Assignee,
];

const EDIT_FIELDS: &[FormField] = &[
    FormField::Title,
    FormField::Description,
    FormField::Priority,
    FormField::Assignee,
    FormField::Progress,
    FormField::Complete,
];

/// Create/edit dialog state. `task_id` is `None` when creating.
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub task_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    /// Index into `Board::users`.
    pub assignee: Option<usize>,
    pub progress: i64,
    pub is_complete: bool,
    pub focus: FormField,
    pub error: Option<String>,
}

impl TaskForm {
    fn blank(assignee: Option<usize>) -> Self {
        Self {
            task_id: None,
            title: String::new(),
            description: String::new(),
            priority: Priority::High,
            assignee,
            progress: 0,
            is_complete: false,
            focus: FormField::Title,
            error: None,
        }
    }

    fn for_task(task: &Task, users: &[User]) -> Self {
        Self {
            task_id: Some(task.id),
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority.parse().unwrap_or_default(),
            assignee: users.iter().position(|u| u.id == task.assigned_to_user_id),
            progress: task.progress,
            is_complete: task.is_complete,
            focus: FormField::Title,
            error: None,
        }
    }

    pub fn is_edit(&self) -> bool {
        self.task_id.is_some()
    }

    pub fn fields(&self) -> &'static [FormField] {
        if self.is_edit() {
            EDIT_FIELDS
        } else {
            CREATE_FIELDS
        }
    }

    pub fn next_field(&mut self) {
        self.step_focus(1);
    }

    pub fn prev_field(&mut self) {
        self.step_focus(-1);
    }

    fn step_focus(&mut self, delta: isize) {
        let fields = self.fields();
        let current = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        let len = fields.len() as isize;
        let next = (current as isize + delta).rem_euclid(len) as usize;
        self.focus = fields[next];
    }

    pub fn insert_char(&mut self, c: char) {
        match self.focus {
            FormField::Title => self.title.push(c),
            FormField::Description => self.description.push(c),
            FormField::Complete if c == ' ' => self.is_complete = !self.is_complete,
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            FormField::Title => {
                self.title.pop();
            }
            FormField::Description => {
                self.description.pop();
            }
            _ => {}
        }
    }

    /// Left/right on a choice field. `user_count` bounds the assignee cycle.
    pub fn adjust(&mut self, forward: bool, user_count: usize) {
        match self.focus {
            FormField::Priority => {
                self.priority = if forward {
                    self.priority.next()
                } else {
                    self.priority.prev()
                };
            }
            FormField::Assignee if user_count > 0 => {
                self.assignee = Some(match (self.assignee, forward) {
                    (None, _) => 0,
                    (Some(i), true) => (i + 1) % user_count,
                    (Some(i), false) => (i + user_count - 1) % user_count,
                });
            }
            FormField::Progress => {
                let step = if forward { PROGRESS_STEP } else { -PROGRESS_STEP };
                self.progress = (self.progress + step).clamp(0, 100);
            }
            FormField::Complete => self.is_complete = !self.is_complete,
            _ => {}
        }
    }
}

pub struct Column {
    pub title: String,
    pub tasks: Vec<Task>,
}

pub struct Board {
    db: Database,
    pub screen: Screen,
    pub current_user: Option<User>,
    pub tasks: Vec<Task>,
    pub users: Vec<User>,
    pub login: LoginForm,
    pub form: Option<TaskForm>,
    pub sort_mode: SortMode,
    pub selected_column: usize,
    pub selected_task: usize,
    pub status: StatusLine,
    pub refreshed_at: Option<DateTime<Local>>,
}

impl Board {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            screen: Screen::Login,
            current_user: None,
            tasks: Vec::new(),
            users: Vec::new(),
            login: LoginForm::default(),
            form: None,
            sort_mode: SortMode::default(),
            selected_column: 0,
            selected_task: 0,
            status: StatusLine::info(MSG_ENTER_CREDENTIALS),
            refreshed_at: None,
        }
    }

    // --- Authentication ---

    pub fn attempt_login(&mut self) {
        let username = self.login.username.trim().to_string();
        let password = self.login.password.trim().to_string();
        match self.db.accounts().login(&username, &password) {
            Ok(user) => self.enter_board(user),
            Err(e) => {
                warn!(error = %e, "Login failed for {:?}", username);
                self.status = StatusLine::error(MSG_LOGIN_FAILED);
            }
        }
    }

    pub fn attempt_register(&mut self) {
        let username = self.login.username.trim().to_string();
        let password = self.login.password.trim().to_string();
        match self.db.accounts().register(&username, &password) {
            Ok(user) => self.enter_board(user),
            Err(e) => {
                warn!(error = %e, "Registration failed for {:?}", username);
                self.status = StatusLine::error(MSG_REGISTER_FAILED);
            }
        }
    }

    pub fn logout(&mut self) {
        self.current_user = None;
        self.tasks.clear();
        self.form = None;
        self.login = LoginForm::default();
        self.screen = Screen::Login;
        self.status = StatusLine::info(MSG_ENTER_CREDENTIALS);
    }

    fn enter_board(&mut self, user: User) {
        self.current_user = Some(user);
        self.login = LoginForm::default();
        self.selected_column = 0;
        self.selected_task = 0;
        self.screen = Screen::Board;
        self.status = StatusLine::info("");
        self.refresh();
    }

    // --- Board ---

    /// Reload tasks and users from the store.
    pub fn refresh(&mut self) {
        if self.current_user.is_none() {
            return;
        }
        match self.db.tasks().list_all() {
            Ok(tasks) => {
                self.tasks = tasks;
                self.refreshed_at = Some(Local::now());
                self.status = StatusLine::info("");
            }
            Err(e) => {
                warn!(error = %e, "Failed to list tasks");
                self.status = StatusLine::error(MSG_LOAD_FAILED);
            }
        }
        match self.db.accounts().list_users() {
            Ok(users) => self.users = users,
            Err(e) => warn!(error = %e, "Failed to list users"),
        }
        self.clamp_selection();
    }

    /// "My Tasks", "All Active Tasks", and "Completed Tasks", each in the current sort order.
    pub fn columns(&self) -> Vec<Column> {
        let me = self.current_user.as_ref().map(|u| u.id);
        let mine: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| Some(t.assigned_to_user_id) == me && !t.is_complete)
            .cloned()
            .collect();
        let active: Vec<Task> = self.tasks.iter().filter(|t| !t.is_complete).cloned().collect();
        let done: Vec<Task> = self.tasks.iter().filter(|t| t.is_complete).cloned().collect();

        [
            ("My Tasks", mine),
            ("All Active Tasks", active),
            ("Completed Tasks", done),
        ]
        .into_iter()
        .map(|(name, tasks)| Column {
            title: format!("{name} ({})", tasks.len()),
            tasks: self.sort_mode.apply(&tasks),
        })
        .collect()
    }

    pub fn selected(&self) -> Option<Task> {
        self.columns()
            .into_iter()
            .nth(self.selected_column)
            .and_then(|c| c.tasks.into_iter().nth(self.selected_task))
    }

    pub fn move_column(&mut self, delta: isize) {
        self.selected_column = (self.selected_column as isize + delta)
            .clamp(0, COLUMN_COUNT as isize - 1) as usize;
        self.selected_task = 0;
    }

    pub fn move_task(&mut self, delta: isize) {
        let len = self.selected_column_len();
        if len == 0 {
            self.selected_task = 0;
            return;
        }
        self.selected_task =
            (self.selected_task as isize + delta).clamp(0, len as isize - 1) as usize;
    }

    pub fn toggle_sort(&mut self) {
        self.sort_mode = match self.sort_mode {
            SortMode::Priority => SortMode::Assignee,
            SortMode::Assignee => SortMode::Priority,
        };
        self.selected_task = 0;
    }

    fn selected_column_len(&self) -> usize {
        self.columns()
            .get(self.selected_column)
            .map_or(0, |c| c.tasks.len())
    }

    fn clamp_selection(&mut self) {
        let len = self.selected_column_len();
        if self.selected_task >= len {
            self.selected_task = len.saturating_sub(1);
        }
    }

    // --- Task form ---

    pub fn open_create_form(&mut self) {
        let me = self.current_user.as_ref().map(|u| u.id);
        let assignee = self
            .users
            .iter()
            .position(|u| Some(u.id) == me)
            .or(if self.users.is_empty() { None } else { Some(0) });
        self.form = Some(TaskForm::blank(assignee));
        self.screen = Screen::TaskForm;
    }

    pub fn open_edit_form(&mut self) {
        if let Some(task) = self.selected() {
            self.form = Some(TaskForm::for_task(&task, &self.users));
            self.screen = Screen::TaskForm;
        }
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
        self.screen = Screen::Board;
    }

    /// Validate and save the open form. On failure the form stays open with an error.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };

        let title = form.title.trim().to_string();
        let description = form.description.trim().to_string();
        let assignee = form.assignee.and_then(|i| self.users.get(i)).map(|u| u.id);
        let Some(assigned_to_user_id) = assignee.filter(|_| !title.is_empty()) else {
            form.error = Some(MSG_FORM_INVALID.to_string());
            return;
        };

        let result = match form.task_id {
            None => self
                .db
                .tasks()
                .create(&TaskDraft {
                    title,
                    description,
                    priority: form.priority,
                    assigned_to_user_id,
                })
                .map(|_| ()),
            Some(id) => self.db.tasks().edit(
                id,
                &TaskUpdate {
                    title,
                    description,
                    priority: form.priority,
                    assigned_to_user_id,
                    is_complete: form.is_complete,
                    progress: form.progress,
                },
            ),
        };

        match result {
            Ok(()) => {
                self.form = None;
                self.screen = Screen::Board;
                self.refresh();
            }
            Err(e) => {
                warn!(error = %e, "Saving task failed");
                form.error = Some(MSG_SAVE_FAILED.to_string());
            }
        }
    }

    // --- Delete ---

    pub fn request_delete(&mut self) {
        if let Some(task) = self.selected() {
            self.screen = Screen::ConfirmDelete(task.id);
        }
    }

    pub fn confirm_delete(&mut self) {
        let Screen::ConfirmDelete(id) = self.screen else {
            return;
        };
        self.screen = Screen::Board;
        match self.db.tasks().delete(id) {
            Ok(()) => self.refresh(),
            Err(e) => {
                warn!(error = %e, task_id = id, "Delete failed");
                self.refresh();
                self.status = StatusLine::error(MSG_DELETE_FAILED);
            }
        }
    }

    pub fn cancel_delete(&mut self) {
        self.screen = Screen::Board;
    }
}
