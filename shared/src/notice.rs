//! Transient user-facing notifications ("toasts").

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeDuration {
    Short,
    Long,
}

impl NoticeDuration {
    pub fn millis(self) -> i32 {
        match self {
            NoticeDuration::Short => 4_000,
            NoticeDuration::Long => 10_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub icon: &'static str,
    pub text: String,
    pub duration: NoticeDuration,
}

impl Notice {
    pub fn info(icon: &'static str, text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            icon,
            text: text.into(),
            duration: NoticeDuration::Short,
        }
    }

    pub fn success(icon: &'static str, text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            ..Self::info(icon, text)
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            ..Self::info("❌", text)
        }
    }

    /// An analysis reply, kept on screen long enough to be read aloud.
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            duration: NoticeDuration::Long,
            ..Self::info("🤖", text)
        }
    }

    pub fn analysis_failed() -> Self {
        Self::error("Oops! I couldn't look at the picture right now. Please try again!")
    }

    pub fn chat_failed() -> Self {
        Self::error("Oops! My robot brain got stuck. Please try again!")
    }
}
