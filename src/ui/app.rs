use crate::api::Item;
use crate::sync::{PaneKind, PaneState, ReorderGesture, ScrollSensor, Viewport};
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Editing the filter of one pane
    Filter(PaneKind),
    /// Typing the id of a new catalog item
    AddItem,
}

/// Work the event loop must carry out on behalf of a key press or the sensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Select(Item),
    Deselect(Item),
    Reorder(ReorderGesture),
    SetFilter(PaneKind, String),
    AddItem(String),
    NextPage(PaneKind),
    Refresh(PaneKind),
}

/// A row picked up for a drag, waiting to be dropped on another row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragState {
    pub item: Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub level: StatusLevel,
    pub at: DateTime<Local>,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, StatusLevel::Info)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, StatusLevel::Error)
    }

    fn new(text: impl Into<String>, level: StatusLevel) -> Self {
        Self {
            text: text.into(),
            level,
            at: Local::now(),
        }
    }
}

/// Cursor, scroll position and filter input of one pane
#[derive(Debug, Clone)]
pub struct PaneView {
    pub state: PaneState,
    pub cursor: usize,
    pub offset: usize,
    pub filter_input: String,
    sensor: ScrollSensor,
}

impl PaneView {
    fn new(sensor_threshold: f32) -> Self {
        Self {
            state: PaneState::default(),
            cursor: 0,
            offset: 0,
            filter_input: String::new(),
            sensor: ScrollSensor::new(sensor_threshold),
        }
    }

    pub fn current_item(&self) -> Option<Item> {
        self.state.items.get(self.cursor).copied()
    }

    fn viewport(&self, height: usize) -> Viewport {
        Viewport {
            offset: self.offset,
            height,
            content_len: self.state.len(),
        }
    }

    /// Keep the cursor on screen with one row of margin below it, so the
    /// sentinel after the last item shows when the cursor reaches the end.
    fn scroll_into_view(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        }
        let margin_row = self.cursor + 1;
        if margin_row >= self.offset + height {
            self.offset = (margin_row + 1).saturating_sub(height);
        }
    }
}

pub struct App {
    pub focus: PaneKind,
    pub mode: InputMode,
    pub available: PaneView,
    pub selected: PaneView,
    pub add_input: String,
    pub drag: Option<DragState>,
    pub status: Option<StatusLine>,
    pub should_quit: bool,
    list_height: usize,
}

impl App {
    pub fn new(sensor_threshold: f32) -> Self {
        Self {
            focus: PaneKind::Available,
            mode: InputMode::Normal,
            available: PaneView::new(sensor_threshold),
            selected: PaneView::new(sensor_threshold),
            add_input: String::new(),
            drag: None,
            status: None,
            should_quit: false,
            list_height: 0,
        }
    }

    pub fn view(&self, kind: PaneKind) -> &PaneView {
        match kind {
            PaneKind::Available => &self.available,
            PaneKind::Selected => &self.selected,
        }
    }

    pub fn view_mut(&mut self, kind: PaneKind) -> &mut PaneView {
        match kind {
            PaneKind::Available => &mut self.available,
            PaneKind::Selected => &mut self.selected,
        }
    }

    /// Take a fresh snapshot of a pane's state.
    pub fn update_pane(&mut self, kind: PaneKind, state: PaneState) {
        let height = self.list_height;
        let view = self.view_mut(kind);
        if state.generation() != view.state.generation() {
            // A reset load replaced the list
            view.cursor = 0;
            view.offset = 0;
            view.sensor.reset();
        }
        view.state = state;
        view.cursor = view.cursor.min(view.state.len().saturating_sub(1));
        view.scroll_into_view(height);

        if let Some(drag) = self.drag {
            if !self.selected.state.contains(drag.item.id) {
                self.drag = None;
            }
        }
    }

    pub fn set_list_height(&mut self, height: usize) {
        self.list_height = height;
        self.available.scroll_into_view(height);
        self.selected.scroll_into_view(height);
    }

    pub fn list_height(&self) -> usize {
        self.list_height
    }

    pub fn set_status(&mut self, status: StatusLine) {
        self.status = Some(status);
    }

    /// Near-end signals for panes whose sentinel just came into view.
    /// Empty and exhausted panes have nothing to page.
    pub fn poll_sensors(&mut self) -> Vec<Command> {
        let height = self.list_height;
        let mut commands = Vec::new();
        for kind in [PaneKind::Available, PaneKind::Selected] {
            let view = self.view_mut(kind);
            let viewport = view.viewport(height);
            let fired = view.sensor.observe(viewport);
            if fired && !view.state.is_empty() && !view.state.exhausted {
                commands.push(Command::NextPage(kind));
            }
        }
        commands
    }

    pub fn toggle_focus(&mut self) {
        self.focus = self.focus.other();
    }

    pub fn next(&mut self) {
        let height = self.list_height;
        let view = self.view_mut(self.focus);
        if view.cursor + 1 < view.state.len() {
            view.cursor += 1;
        }
        view.scroll_into_view(height);
    }

    pub fn previous(&mut self) {
        let height = self.list_height;
        let view = self.view_mut(self.focus);
        view.cursor = view.cursor.saturating_sub(1);
        view.scroll_into_view(height);
    }

    pub fn jump_to_top(&mut self) {
        let height = self.list_height;
        let view = self.view_mut(self.focus);
        view.cursor = 0;
        view.scroll_into_view(height);
    }

    pub fn jump_to_bottom(&mut self) {
        let height = self.list_height;
        let view = self.view_mut(self.focus);
        view.cursor = view.state.len().saturating_sub(1);
        view.scroll_into_view(height);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        match self.mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Filter(kind) => self.handle_filter_key(kind, key),
            InputMode::AddItem => self.handle_add_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                None
            }
            KeyCode::Tab => {
                self.toggle_focus();
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.next();
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.previous();
                None
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.jump_to_top();
                None
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.jump_to_bottom();
                None
            }
            KeyCode::Char('/') => {
                self.mode = InputMode::Filter(self.focus);
                None
            }
            KeyCode::Char('a') => {
                self.mode = InputMode::AddItem;
                self.add_input.clear();
                None
            }
            KeyCode::Char('r') => Some(Command::Refresh(self.focus)),
            KeyCode::Char('m') if self.focus == PaneKind::Selected => {
                if self.drag.is_some() {
                    self.drop_dragged()
                } else {
                    self.drag = self
                        .selected
                        .current_item()
                        .map(|item| DragState { item });
                    None
                }
            }
            KeyCode::Esc => {
                self.drag = None;
                None
            }
            KeyCode::Enter => {
                if self.drag.is_some() && self.focus == PaneKind::Selected {
                    return self.drop_dragged();
                }
                let item = self.view(self.focus).current_item()?;
                match self.focus {
                    PaneKind::Available => Some(Command::Select(item)),
                    PaneKind::Selected => Some(Command::Deselect(item)),
                }
            }
            _ => None,
        }
    }

    /// Drop the dragged row onto the row under the cursor.
    fn drop_dragged(&mut self) -> Option<Command> {
        let drag = self.drag.take()?;
        let target = self.selected.current_item()?;
        let dragged_index = self.selected.state.position(drag.item.id)?;
        if target.id == drag.item.id {
            return None;
        }
        Some(Command::Reorder(ReorderGesture {
            dragged_id: drag.item.id,
            target_id: target.id,
            dragged_index,
            target_index: self.selected.cursor,
        }))
    }

    fn handle_filter_key(&mut self, kind: PaneKind, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.mode = InputMode::Normal;
                None
            }
            KeyCode::Backspace => {
                let view = self.view_mut(kind);
                view.filter_input.pop()?;
                Some(Command::SetFilter(kind, view.filter_input.clone()))
            }
            KeyCode::Char(c) => {
                let view = self.view_mut(kind);
                view.filter_input.push(c);
                Some(Command::SetFilter(kind, view.filter_input.clone()))
            }
            _ => None,
        }
    }

    fn handle_add_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
                self.add_input.clear();
                None
            }
            KeyCode::Enter => {
                self.mode = InputMode::Normal;
                let input = std::mem::take(&mut self.add_input);
                Some(Command::AddItem(input))
            }
            KeyCode::Backspace => {
                self.add_input.pop();
                None
            }
            KeyCode::Char(c) => {
                self.add_input.push(c);
                None
            }
            _ => None,
        }
    }
}
