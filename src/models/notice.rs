use serde::{Deserialize, Serialize};

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Danger,
}

/// A message shown to the desk operator alongside a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Danger, message: message.into() }
    }
}

/// Data for a view together with the notices produced while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct View<T> {
    pub data: T,
    pub notices: Vec<Notice>,
}

impl<T> View<T> {
    pub fn new(data: T) -> Self {
        Self { data, notices: Vec::new() }
    }

    pub fn with_notice(data: T, notice: Notice) -> Self {
        Self { data, notices: vec![notice] }
    }
}
