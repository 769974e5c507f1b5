use crate::board::{Board, FormField, LoginField, Screen, TaskForm, COLUMN_COUNT};
use crate::task::Task;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, board: &mut Board) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, board))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && handle_key(board, key) {
                return Ok(());
            }
        }
    }
}

/// Apply one key press. Returns `true` when the app should exit.
pub fn handle_key(board: &mut Board, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }
    match board.screen {
        Screen::Login if key.code == KeyCode::Esc => return true,
        Screen::Login => handle_login_key(board, key),
        Screen::Board => return handle_board_key(board, key),
        Screen::TaskForm => handle_form_key(board, key),
        Screen::ConfirmDelete(_) => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => board.confirm_delete(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => board.cancel_delete(),
            _ => {}
        },
    }
    false
}

fn handle_login_key(board: &mut Board, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => board.attempt_login(),
        KeyCode::F(2) => board.attempt_register(),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            board.login.toggle_focus()
        }
        KeyCode::Backspace => board.login.backspace(),
        KeyCode::Char(c) => board.login.insert_char(c),
        _ => {}
    }
}

fn handle_board_key(board: &mut Board, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => return true, // Quit
        KeyCode::Char('n') => board.open_create_form(),
        KeyCode::Char('e') | KeyCode::Enter => board.open_edit_form(),
        KeyCode::Char('d') => board.request_delete(),
        KeyCode::Char('s') => board.toggle_sort(),
        KeyCode::Char('r') => board.refresh(),
        KeyCode::Char('l') => board.logout(),
        KeyCode::Left => board.move_column(-1),
        KeyCode::Right => board.move_column(1),
        KeyCode::Up => board.move_task(-1),
        KeyCode::Down => board.move_task(1),
        _ => {}
    }
    false
}

fn handle_form_key(board: &mut Board, key: KeyEvent) {
    let user_count = board.users.len();
    match key.code {
        KeyCode::Esc => board.cancel_form(),
        KeyCode::Enter => board.submit_form(),
        _ => {
            let Some(form) = board.form.as_mut() else {
                return;
            };
            match key.code {
                KeyCode::Tab | KeyCode::Down => form.next_field(),
                KeyCode::BackTab | KeyCode::Up => form.prev_field(),
                KeyCode::Left => form.adjust(false, user_count),
                KeyCode::Right => form.adjust(true, user_count),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Char(c) => form.insert_char(c),
                _ => {}
            }
        }
    }
}

pub fn draw(f: &mut Frame, board: &Board) {
    match board.screen {
        Screen::Login => draw_login(f, board),
        Screen::Board => draw_board(f, board),
        Screen::TaskForm => {
            draw_board(f, board);
            if let Some(form) = &board.form {
                draw_form(f, board, form);
            }
        }
        Screen::ConfirmDelete(id) => {
            draw_board(f, board);
            draw_confirm(f, id);
        }
    }
}

fn draw_login(f: &mut Frame, board: &Board) {
    let area = centered_rect(50, 12, f.area());
    let focused = |field: LoginField| {
        if board.login.focus == field {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        }
    };
    let masked = "*".repeat(board.login.password.chars().count());
    let status_style = if board.status.is_error {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Blue)
    };

    let lines = vec![
        Line::from(Span::styled(
            "Task Manager Login",
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::from(""),
        Line::from(vec![
            Span::styled("Username: ", focused(LoginField::Username)),
            Span::raw(board.login.username.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Password: ", focused(LoginField::Password)),
            Span::raw(masked),
        ]),
        Line::from(""),
        Line::from(Span::styled(board.status.text.as_str(), status_style))
            .alignment(Alignment::Center),
        Line::from(""),
        Line::from("Enter: login   F2: register   Tab: switch field   Esc: quit")
            .alignment(Alignment::Center),
    ];

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title("Login / Register")
                .borders(Borders::ALL),
        ),
        area,
    );
}

fn draw_board(f: &mut Frame, board: &Board) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    let header = match &board.current_user {
        Some(user) => format!(" Logged in as: {} (ID: {})", user.username, user.id),
        None => String::new(),
    };
    let refreshed = board
        .refreshed_at
        .map(|t| format!("refreshed {}  ", t.format("%H:%M:%S")))
        .unwrap_or_default();
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(header, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("   sorted by {}   ", board.sort_mode.label())),
            Span::raw(refreshed),
        ])),
        rows[0],
    );

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(rows[1]);

    for (i, column) in board.columns().into_iter().enumerate().take(COLUMN_COUNT) {
        let items: Vec<ListItem> = column.tasks.iter().map(task_card).collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .title(column.title)
                    .borders(Borders::ALL)
                    .border_style(if board.selected_column == i {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default()
                    }),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = ListState::default();
        if board.selected_column == i && !column.tasks.is_empty() {
            state.select(Some(board.selected_task));
        }
        f.render_stateful_widget(list, chunks[i], &mut state);
    }

    let footer = if board.status.text.is_empty() {
        Span::raw("n: new  e: edit  d: delete  s: sort  r: refresh  l: logout  q: quit")
    } else if board.status.is_error {
        Span::styled(board.status.text.as_str(), Style::default().fg(Color::Red))
    } else {
        Span::raw(board.status.text.as_str())
    };
    f.render_widget(Paragraph::new(Line::from(footer)), rows[2]);
}

fn card_color(task: &Task) -> Color {
    if task.is_complete {
        return Color::Green;
    }
    match task.priority.as_str() {
        "High" => Color::Red,
        "Medium" => Color::Yellow,
        _ => Color::Gray,
    }
}

fn task_card(task: &Task) -> ListItem<'static> {
    let status_color = if task.is_complete {
        Color::Green
    } else if task.progress < 100 {
        Color::Blue
    } else {
        Color::Gray
    };
    ListItem::new(Text::from(vec![
        Line::from(vec![
            Span::styled(
                format!("[#{}] {}", task.id, task.title),
                Style::default()
                    .fg(card_color(task))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(task.status_text(), Style::default().fg(status_color)),
        ]),
        Line::from(format!("  {}", task.description_preview())),
        Line::from(Span::styled(
            format!("  Assigned: {}", task.assigned_to_username),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ]))
}

fn draw_form(f: &mut Frame, board: &Board, form: &TaskForm) {
    let area = centered_rect(60, 14, f.area());
    let title = match form.task_id {
        Some(id) => format!("Edit Task ID {id}"),
        None => "Create New Task".to_string(),
    };
    let assignee = form
        .assignee
        .and_then(|i| board.users.get(i))
        .map_or_else(|| "(none)".to_string(), |u| format!("{} - {}", u.id, u.username));

    let mut lines: Vec<Line> = form
        .fields()
        .iter()
        .map(|field| {
            let (label, value) = match field {
                FormField::Title => ("Title", form.title.clone()),
                FormField::Description => ("Description", form.description.clone()),
                FormField::Priority => ("Priority", format!("< {} >", form.priority)),
                FormField::Assignee => ("Assign To", format!("< {assignee} >")),
                FormField::Progress => ("Progress (%)", format!("< {} >", form.progress)),
                FormField::Complete => (
                    "Complete",
                    if form.is_complete { "[x]" } else { "[ ]" }.to_string(),
                ),
            };
            let style = if *field == form.focus {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{label:>13}: "), style),
                Span::raw(value),
            ])
        })
        .collect();

    lines.push(Line::from(""));
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(
        "Enter: save  Esc: cancel  Tab: next field  \u{2190}/\u{2192}: change  Space: toggle",
    ));

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().title(title).borders(Borders::ALL)),
        area,
    );
}

fn draw_confirm(f: &mut Frame, id: i64) {
    let area = centered_rect(60, 5, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(format!(
            "Are you sure you want to delete Task ID {id}? (y/n)"
        ))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title("Confirm Delete")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        ),
        area,
    );
}

/// A `width` x `height` rectangle centred in `area`, shrunk to fit.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
