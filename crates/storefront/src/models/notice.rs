//! One-shot notices.
//!
//! A handler stores a [`Notice`] in the session before redirecting; the next
//! rendered page takes it out and shows it as a toast.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session::keys;

/// Severity of a notice, used to pick the toast style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Warning,
    Info,
}

impl NoticeLevel {
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "toast--success",
            Self::Error => "toast--error",
            Self::Warning => "toast--warning",
            Self::Info => "toast--info",
        }
    }
}

/// A message for the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub text: Option<String>,
}

impl Notice {
    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title)
    }

    fn new(level: NoticeLevel, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            text: None,
        }
    }

    /// Attach a second line.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Queue a notice for the next page.
///
/// Session failures are logged, not propagated.
pub async fn push_notice(session: &Session, notice: Notice) {
    if let Err(e) = session.insert(keys::NOTICE, notice).await {
        tracing::warn!("Failed to store notice in session: {e}");
    }
}

/// Take the pending notice, if any.
pub async fn take_notice(session: &Session) -> Option<Notice> {
    session
        .remove::<Notice>(keys::NOTICE)
        .await
        .ok()
        .flatten()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_notice_is_shown_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        push_notice(&session, Notice::success("Order Placed!").with_text("Enjoy")).await;

        let notice = take_notice(&session).await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.text.as_deref(), Some("Enjoy"));
        assert!(take_notice(&session).await.is_none());
    }
}
