use crate::effect::{Effect, Nav, Status};
use crate::error::ApiError;
use crate::models::TodoItem;
use crate::optimistic::{InFlight, Settlement, TodoStore};
use crate::request::{Request, Response};
use ratatui::widgets::ListState;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Column {
    Todo,
    Done,
}

pub struct ListView {
    pub store: TodoStore,
    pub column: Column,
    pub todo_state: ListState,
    pub done_state: ListState,
    pub new_name: String,
    pub loaded: bool,
    pending_creates: Vec<String>,
    page_size: u32,
}

impl ListView {
    pub fn new(page_size: u32) -> ListView {
        ListView {
            store: TodoStore::default(),
            column: Column::Todo,
            todo_state: ListState::default(),
            done_state: ListState::default(),
            new_name: String::new(),
            loaded: false,
            pending_creates: Vec::new(),
            page_size,
        }
    }

    pub fn mount(&self) -> Request {
        Request::List {
            page: 1,
            page_size: self.page_size,
        }
    }

    fn column_items(&self, column: Column) -> Vec<&TodoItem> {
        let (todo, done) = self.store.partition();
        match column {
            Column::Todo => todo,
            Column::Done => done,
        }
    }

    fn state_mut(&mut self) -> &mut ListState {
        match self.column {
            Column::Todo => &mut self.todo_state,
            Column::Done => &mut self.done_state,
        }
    }

    pub fn selected(&self) -> Option<&TodoItem> {
        let state = match self.column {
            Column::Todo => &self.todo_state,
            Column::Done => &self.done_state,
        };
        let index = state.selected()?;
        self.column_items(self.column).get(index).copied()
    }

    pub fn next(&mut self) {
        let len = self.column_items(self.column).len();
        if len == 0 {
            return;
        }
        let state = self.state_mut();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.column_items(self.column).len();
        if len == 0 {
            return;
        }
        let state = self.state_mut();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    pub fn switch_column(&mut self) {
        self.column = match self.column {
            Column::Todo => Column::Done,
            Column::Done => Column::Todo,
        };
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let todo_len = self.column_items(Column::Todo).len();
        let done_len = self.column_items(Column::Done).len();
        clamp(&mut self.todo_state, todo_len);
        clamp(&mut self.done_state, done_len);
    }

    pub fn open_selected(&self) -> Effect {
        match self.selected() {
            Some(item) => Effect::nav(Nav::Detail(item.id)),
            None => Effect::none(),
        }
    }

    pub fn toggle_selected(&mut self, wire: &InFlight) -> Effect {
        let Some(id) = self.selected().map(|item| item.id) else {
            return Effect::none();
        };
        match self
            .store
            .begin(id, wire, |item| item.is_completed = !item.is_completed)
        {
            Ok(speculative) => {
                self.clamp_selection();
                Effect::request(Request::Update(speculative))
            }
            Err(err) => Effect::status(Status::error(err.to_string())),
        }
    }

    /// An update sent from an earlier screen came back.
    pub fn refresh_item(&mut self, item: TodoItem) {
        if self.store.refresh(item) {
            self.clamp_selection();
        }
    }

    /// Validates the typed name and asks for it to be created. Nothing is
    /// added locally until the service answers.
    pub fn submit_new(&mut self) -> Effect {
        match validate_new_name(&self.store, &self.pending_creates, &self.new_name) {
            Ok(name) => {
                self.new_name.clear();
                self.pending_creates.push(name.clone());
                Effect::request(Request::Create(name))
            }
            Err(err) => Effect::status(Status::error(err.to_string())),
        }
    }

    pub fn on_response(&mut self, response: Response) -> Effect {
        let effect = match response {
            Response::Listed(Ok(items)) => {
                info!(count = items.len(), "loaded todos");
                self.store.replace_all(items);
                self.loaded = true;
                Effect::none()
            }
            Response::Listed(Err(err)) => {
                error!(error = %err, "failed to fetch todos");
                self.store.replace_all(Vec::new());
                self.loaded = true;
                Effect::status(Status::error(format!("Could not load todos: {}", err)))
            }
            Response::Created(name, result) => {
                self.pending_creates.retain(|pending| *pending != name);
                match result {
                    Ok(item) => {
                        let status = Status::info(format!("Added \"{}\"", item.name));
                        self.store.prepend(item);
                        Effect::status(status)
                    }
                    Err(err) => {
                        error!(error = %err, name = %name, "failed to create todo");
                        Effect::status(Status::error(format!("Could not add \"{}\": {}", name, err)))
                    }
                }
            }
            Response::Updated(id, result) => match self.store.settle(id, result) {
                Settlement::RolledBack(err) => {
                    Effect::status(Status::error(format!("Could not update todo {}: {}", id, err)))
                }
                Settlement::Committed(_) | Settlement::Stale => Effect::none(),
            },
            _ => Effect::none(),
        };
        self.clamp_selection();
        effect
    }
}

fn clamp(state: &mut ListState, len: usize) {
    if len == 0 {
        state.select(None);
    } else {
        let i = state.selected().unwrap_or(0).min(len - 1);
        state.select(Some(i));
    }
}

/// Trimmed, non-empty, and not already in the list or on its way there.
pub fn validate_new_name(
    store: &TodoStore,
    pending: &[String],
    input: &str,
) -> Result<String, ApiError> {
    let name = input.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("name cannot be empty".to_string()));
    }
    if store.contains_name(name) || pending.iter().any(|p| p == name) {
        return Err(ApiError::Validation(format!("\"{}\" is already on the list", name)));
    }
    Ok(name.to_string())
}
