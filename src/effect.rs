use crate::models::TodoId;
use crate::request::Request;
use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Level {
    Info,
    Error,
}

/// One line of feedback for the status bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub at: DateTime<Local>,
    pub level: Level,
    pub text: String,
}

impl Status {
    pub fn info(text: impl Into<String>) -> Status {
        Status {
            at: Local::now(),
            level: Level::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Status {
        Status {
            at: Local::now(),
            level: Level::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Nav {
    List,
    Detail(TodoId),
}

/// What a view asks the app to do after handling a key or a response.
#[derive(Debug, Default)]
pub struct Effect {
    pub request: Option<Request>,
    pub status: Option<Status>,
    pub nav: Option<Nav>,
}

impl Effect {
    pub fn none() -> Effect {
        Effect::default()
    }

    pub fn request(request: Request) -> Effect {
        Effect {
            request: Some(request),
            ..Effect::default()
        }
    }

    pub fn status(status: Status) -> Effect {
        Effect {
            status: Some(status),
            ..Effect::default()
        }
    }

    pub fn nav(nav: Nav) -> Effect {
        Effect {
            nav: Some(nav),
            ..Effect::default()
        }
    }

    pub fn with_status(mut self, status: Status) -> Effect {
        self.status = Some(status);
        self
    }
}
