// src/click.rs
use std::ops::BitOr;
use std::sync::Arc;

use crate::config::ClickBehavior;

/// Mouse buttons held during a click, as a bit mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseButtons(pub u8);

impl MouseButtons {
    pub const NONE: Self = Self(0);
    pub const LEFT: Self = Self(1);
    pub const RIGHT: Self = Self(2);
    pub const MIDDLE: Self = Self(4);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl BitOr for MouseButtons {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Platform side effects for chirp clicks. Owned by the host UI.
pub trait ClickSurface: Send + Sync {
    fn open_overlay(&self, url: &str);
    fn copy_to_clipboard(&self, url: &str);
    fn open_browser(&self, url: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// No post id, or not a left click.
    Ignored,
    Overlay(String),
    Clipboard(String),
    Browser(String),
    /// Behavior is "nothing"; the url is still reported.
    Nothing(String),
}

pub fn post_url(item_id: &str) -> String {
    format!("https://reddit.com/{item_id}")
}

pub struct ClickDispatcher {
    surface: Arc<dyn ClickSurface>,
}

impl ClickDispatcher {
    pub fn new(surface: Arc<dyn ClickSurface>) -> Self {
        Self { surface }
    }

    /// Route a click on the chirp carrying `item_id`. Only the left button counts.
    pub fn dispatch(
        &self,
        behavior: ClickBehavior,
        item_id: &str,
        buttons: MouseButtons,
    ) -> ClickAction {
        if item_id.is_empty() || !buttons.contains(MouseButtons::LEFT) {
            return ClickAction::Ignored;
        }
        let url = post_url(item_id);
        tracing::debug!(target: "click", %url, ?behavior, "chirp clicked");

        match behavior {
            ClickBehavior::Overlay => {
                self.surface.open_overlay(&url);
                ClickAction::Overlay(url)
            }
            ClickBehavior::Clipboard => {
                self.surface.copy_to_clipboard(&url);
                ClickAction::Clipboard(url)
            }
            ClickBehavior::Browser => {
                self.surface.open_browser(&url);
                ClickAction::Browser(url)
            }
            ClickBehavior::Nothing => ClickAction::Nothing(url),
        }
    }
}
