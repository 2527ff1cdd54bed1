use crate::sync::PaneKind;
use crate::ui::app::{App, InputMode, PaneView, StatusLevel};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Rows taken by a pane's border and filter line
const PANE_CHROME_ROWS: u16 = 3;

struct Areas {
    header: Rect,
    available: Rect,
    selected: Rect,
    help: Rect,
    status: Rect,
}

fn split(area: Rect) -> Areas {
    // Main layout: Header + Body + Help + Status
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Body
            Constraint::Length(1), // Help
            Constraint::Length(1), // Status
        ])
        .split(area);

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_chunks[1]);

    Areas {
        header: main_chunks[0],
        available: body_chunks[0],
        selected: body_chunks[1],
        help: main_chunks[2],
        status: main_chunks[3],
    }
}

/// Number of list rows a pane can show in a frame of the given size.
pub fn list_height(area: Rect) -> usize {
    split(area)
        .available
        .height
        .saturating_sub(PANE_CHROME_ROWS) as usize
}

pub fn render(frame: &mut Frame, app: &App) {
    let areas = split(frame.area());

    render_header(frame, app, areas.header);
    render_pane(frame, app, PaneKind::Available, areas.available);
    render_pane(frame, app, PaneKind::Selected, areas.selected);
    render_help(frame, app, areas.help);
    render_status(frame, app, areas.status);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let adding = app.mode == InputMode::AddItem;
    let input_style = if adding {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Gray)
    };

    let mut spans = vec![
        Span::styled(
            "  PICKER  ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ Add item id: ", Style::default().fg(Color::Gray)),
        Span::styled(app.add_input.clone(), input_style),
    ];
    if adding {
        spans.push(Span::styled("█", input_style));
    } else {
        spans.push(Span::styled(" (press a)", Style::default().fg(Color::DarkGray)));
    }

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(header, area);
}

fn render_pane(frame: &mut Frame, app: &App, kind: PaneKind, area: Rect) {
    let view = app.view(kind);
    let focused = app.focus == kind;
    let border_color = if focused { Color::Cyan } else { Color::Gray };

    let title = if view.state.current_page > 0 {
        format!(" {} ({}/{}) ", kind.title(), view.state.len(), view.state.total)
    } else {
        format!(" {} ", kind.title())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    render_filter_line(frame, app, kind, view, chunks[0]);

    let height = chunks[1].height as usize;
    let items = visible_rows(app, kind, view, focused, height);
    frame.render_widget(List::new(items), chunks[1]);
}

fn render_filter_line(frame: &mut Frame, app: &App, kind: PaneKind, view: &PaneView, area: Rect) {
    let editing = app.mode == InputMode::Filter(kind);
    let style = if editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Gray)
    };

    let mut spans = vec![
        Span::styled("/ ", style),
        Span::styled(view.filter_input.clone(), style),
    ];
    if editing {
        spans.push(Span::styled("█", style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn visible_rows<'a>(
    app: &App,
    kind: PaneKind,
    view: &PaneView,
    focused: bool,
    height: usize,
) -> Vec<ListItem<'a>> {
    let dragged = app.drag.map(|d| d.item.id);
    let mut rows: Vec<ListItem> = view
        .state
        .items
        .iter()
        .enumerate()
        .skip(view.offset)
        .take(height)
        .map(|(i, item)| {
            let is_cursor = focused && i == view.cursor;
            let is_dragged = kind == PaneKind::Selected && dragged == Some(item.id);
            let style = if is_cursor {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if is_dragged {
                Style::default().fg(Color::Magenta)
            } else {
                Style::default().fg(Color::White)
            };
            let marker = if is_dragged { "≡ " } else { "  " };
            ListItem::new(format!("{}Item {}", marker, item.id)).style(style)
        })
        .collect();

    // Sentinel row after the last item
    if rows.len() < height {
        let state = &view.state;
        let sentinel = if state.is_loading {
            ListItem::new("  Loading…").style(Style::default().fg(Color::Yellow))
        } else if state.fully_loaded() {
            ListItem::new("  All items loaded").style(Style::default().fg(Color::DarkGray))
        } else if state.exhausted {
            ListItem::new("  No items").style(Style::default().fg(Color::DarkGray))
        } else {
            ListItem::new("")
        };
        rows.push(sentinel);
    }

    rows
}

fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = match app.mode {
        InputMode::Filter(_) => "Type to filter  [Backspace] Delete  [Enter/Esc] Done",
        InputMode::AddItem => "Type an id  [Enter] Add  [Esc] Cancel",
        InputMode::Normal if app.drag.is_some() => {
            "[↑↓/jk] Choose target  [Enter/m] Drop  [Esc] Cancel"
        }
        InputMode::Normal => match app.focus {
            PaneKind::Available => {
                "[↑↓/jk] Navigate  [Enter] Select  [/] Filter  [a] Add  [r] Refresh  [Tab] Switch  [Q] Quit"
            }
            PaneKind::Selected => {
                "[↑↓/jk] Navigate  [Enter] Deselect  [m] Move  [/] Filter  [r] Refresh  [Tab] Switch  [Q] Quit"
            }
        },
    };

    let footer = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default());

    frame.render_widget(footer, area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let Some(status) = &app.status else {
        return;
    };
    let color = match status.level {
        StatusLevel::Info => Color::Green,
        StatusLevel::Error => Color::Red,
    };
    let line = Line::from(vec![
        Span::styled(
            format!("[{}] ", status.at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(status.text.clone(), Style::default().fg(color)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
