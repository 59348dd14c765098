use strum::{AsRefStr, EnumIter, EnumString};

pub const WAVE_INTERVAL_MS: u64 = 8_000;
pub const WAVE_DURATION_MS: u64 = 1_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, EnumIter, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Tab {
    #[default]
    Draw,
    Upload,
    Chat,
}

impl Tab {
    pub fn icon(self) -> &'static str {
        match self {
            Tab::Draw => "✏️",
            Tab::Upload => "🖼️",
            Tab::Chat => "💬",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Draw => "Draw",
            Tab::Upload => "Pictures",
            Tab::Chat => "Chat",
        }
    }

    pub fn mascot_message(self) -> &'static str {
        match self {
            Tab::Draw => "Let's draw something awesome! Use the magic wand for sparkles!",
            Tab::Upload => "Show me your pictures! I'd love to see what you've got!",
            Tab::Chat => "Have any questions? I'm here to chat with you!",
        }
    }
}

/// Which panel is on screen. Holds nothing else.
#[derive(Debug, Default)]
pub struct Shell {
    active: Tab,
}

impl Shell {
    pub fn active(&self) -> Tab {
        self.active
    }

    /// Makes `tab` active, returning the tab that was left, if any.
    pub fn select(&mut self, tab: Tab) -> Option<Tab> {
        if tab == self.active {
            return None;
        }
        let previous = std::mem::replace(&mut self.active, tab);
        log::debug!("tab {} -> {}", previous.as_ref(), tab.as_ref());
        Some(previous)
    }
}

/// Whether the mascot's arm is raised `elapsed_ms` after the page started.
pub fn mascot_waving(elapsed_ms: u64) -> bool {
    elapsed_ms >= WAVE_INTERVAL_MS && elapsed_ms % WAVE_INTERVAL_MS < WAVE_DURATION_MS
}
