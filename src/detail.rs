use crate::effect::{Effect, Nav, Status};
use crate::models::{TodoId, TodoItem};
use crate::optimistic::{InFlight, Settlement, TodoStore};
use crate::request::{Request, Response};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field {
    Name,
    Memo,
    Image,
}

/// The user's edits to the loaded item, not yet saved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub name: String,
    pub memo: String,
    pub image_url: String,
}

impl Draft {
    pub fn from_item(item: &TodoItem) -> Draft {
        Draft {
            name: item.name.clone(),
            memo: item.memo_text().to_string(),
            image_url: item.image_url_text().to_string(),
        }
    }

    /// A field counts as changed only if it differs and is not blank.
    pub fn is_updated(&self, loaded: &TodoItem) -> bool {
        let changed = |draft: &str, saved: &str| !draft.trim().is_empty() && draft != saved;
        changed(&self.name, &loaded.name)
            || changed(&self.memo, loaded.memo_text())
            || changed(&self.image_url, loaded.image_url_text())
    }

    fn apply_to(&self, item: &mut TodoItem) {
        if !self.name.trim().is_empty() {
            item.name = self.name.clone();
        }
        item.memo = (!self.memo.is_empty()).then(|| self.memo.clone());
        item.image_url = (!self.image_url.is_empty()).then(|| self.image_url.clone());
    }
}

pub struct DetailView {
    pub id: TodoId,
    pub store: TodoStore,
    pub draft: Draft,
    pub focus: Field,
    /// Memo keystrokes land here and reach the draft on blur.
    pub memo_buffer: String,
    pub image_path: String,
    pub load_error: Option<String>,
    saving: bool,
    deleting: bool,
    uploading: bool,
}

impl DetailView {
    pub fn new(id: TodoId) -> DetailView {
        DetailView {
            id,
            store: TodoStore::default(),
            draft: Draft::default(),
            focus: Field::Name,
            memo_buffer: String::new(),
            image_path: String::new(),
            load_error: None,
            saving: false,
            deleting: false,
            uploading: false,
        }
    }

    pub fn mount(&self) -> Request {
        Request::Get(self.id)
    }

    pub fn item(&self) -> Option<&TodoItem> {
        self.store.get(self.id)
    }

    pub fn is_updated(&self) -> bool {
        self.item()
            .map(|item| self.draft.is_updated(item))
            .unwrap_or(false)
    }

    pub fn is_busy(&self) -> bool {
        self.saving || self.deleting || self.uploading || self.store.is_pending(self.id)
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            Field::Name => Field::Memo,
            Field::Memo => Field::Image,
            Field::Image => Field::Name,
        };
    }

    pub fn start_editing(&mut self) {
        if self.focus == Field::Memo {
            self.memo_buffer = self.draft.memo.clone();
        }
    }

    pub fn input_char(&mut self, c: char) {
        match self.focus {
            Field::Name => self.draft.name.push(c),
            Field::Memo => self.memo_buffer.push(c),
            Field::Image => self.image_path.push(c),
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            Field::Name => {
                self.draft.name.pop();
            }
            Field::Memo => {
                self.memo_buffer.pop();
            }
            Field::Image => {
                self.image_path.pop();
            }
        }
    }

    /// The focused field loses focus.
    pub fn blur(&mut self) {
        if self.focus == Field::Memo {
            self.draft.memo = self.memo_buffer.clone();
        }
    }

    pub fn upload_image(&mut self) -> Effect {
        let path = self.image_path.trim();
        if path.is_empty() {
            return Effect::status(Status::error("Type the path of an image file first"));
        }
        if self.uploading {
            return Effect::status(Status::error("An upload is already running"));
        }
        self.uploading = true;
        Effect::request(Request::UploadImage(PathBuf::from(path)))
            .with_status(Status::info("Uploading image..."))
    }

    pub fn toggle(&mut self, wire: &InFlight) -> Effect {
        match self
            .store
            .begin(self.id, wire, |item| item.is_completed = !item.is_completed)
        {
            Ok(speculative) => Effect::request(Request::Update(speculative)),
            Err(err) => Effect::status(Status::error(err.to_string())),
        }
    }

    pub fn save(&mut self, wire: &InFlight) -> Effect {
        if !self.is_updated() {
            return Effect::status(Status::error("Nothing to save"));
        }
        let draft = self.draft.clone();
        match self.store.begin(self.id, wire, |item| draft.apply_to(item)) {
            Ok(speculative) => {
                self.saving = true;
                Effect::request(Request::Update(speculative))
            }
            Err(err) => Effect::status(Status::error(err.to_string())),
        }
    }

    /// An update sent from an earlier screen came back. Untouched fields
    /// follow it; the user's edits are kept.
    pub fn refresh_item(&mut self, item: TodoItem) {
        let Some(old) = self.item().map(Draft::from_item) else {
            return;
        };
        let fresh = Draft::from_item(&item);
        if self.store.refresh(item) && self.draft == old {
            self.draft = fresh;
            self.memo_buffer = self.draft.memo.clone();
        }
    }

    pub fn delete(&mut self) -> Effect {
        if self.deleting || self.item().is_none() {
            return Effect::none();
        }
        self.deleting = true;
        Effect::request(Request::Delete(self.id))
    }

    pub fn on_response(&mut self, response: Response) -> Effect {
        match response {
            Response::Fetched(id, result) if id == self.id => match result {
                Ok(item) => {
                    self.draft = Draft::from_item(&item);
                    self.memo_buffer = self.draft.memo.clone();
                    self.store.replace_all(vec![item]);
                    self.load_error = None;
                    Effect::none()
                }
                Err(err) => {
                    error!(%id, error = %err, "failed to fetch todo");
                    self.load_error = Some(err.to_string());
                    Effect::status(Status::error(format!("Could not load todo {}: {}", id, err)))
                }
            },
            Response::Updated(id, result) if id == self.id => {
                let saving = std::mem::take(&mut self.saving);
                match self.store.settle(id, result) {
                    Settlement::Committed(item) if saving => {
                        info!(%id, "saved todo");
                        let status = Status::info(format!("Saved \"{}\"", item.name));
                        Effect::nav(Nav::List).with_status(status)
                    }
                    Settlement::RolledBack(err) => {
                        Effect::status(Status::error(format!("Could not save todo {}: {}", id, err)))
                    }
                    _ => Effect::none(),
                }
            }
            Response::Deleted(id, result) if id == self.id => {
                self.deleting = false;
                match result {
                    Ok(()) => {
                        info!(%id, "deleted todo");
                        self.store.remove(id);
                        Effect::nav(Nav::List).with_status(Status::info("Deleted"))
                    }
                    Err(err) => {
                        error!(%id, error = %err, "failed to delete todo");
                        Effect::status(Status::error(format!("Could not delete todo {}: {}", id, err)))
                    }
                }
            }
            Response::ImageUploaded(result) => {
                self.uploading = false;
                match result {
                    Ok(url) => {
                        self.draft.image_url = url;
                        self.image_path.clear();
                        Effect::status(Status::info("Image uploaded, save to keep it"))
                    }
                    Err(err) => {
                        error!(error = %err, "image upload failed");
                        Effect::status(Status::error(err.to_string()))
                    }
                }
            }
            _ => Effect::none(),
        }
    }
}
