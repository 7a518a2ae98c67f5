//! Read-only projection over the persisted collections.

use crate::chat::{ChatHistory, Message};

/// Which collection the browser shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserTab {
    #[default]
    Histories,
    Favorites,
}

impl BrowserTab {
    pub fn toggled(self) -> Self {
        match self {
            BrowserTab::Histories => BrowserTab::Favorites,
            BrowserTab::Favorites => BrowserTab::Histories,
        }
    }
}

/// One displayed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserRow {
    History {
        id: String,
        title: String,
        last_message: String,
        timestamp: i64,
    },
    Favorite {
        id: String,
        text: String,
        timestamp: i64,
    },
}

/// Snapshot of both collections for display.
///
/// The browser cannot mutate anything; selecting a history row only yields
/// the id to hand to `ChatSession::restore_history`.
#[derive(Debug, Clone, Default)]
pub struct ArchiveBrowser {
    histories: Vec<ChatHistory>,
    favorites: Vec<Message>,
}

impl ArchiveBrowser {
    pub fn new(histories: Vec<ChatHistory>, favorites: Vec<Message>) -> Self {
        Self {
            histories,
            favorites,
        }
    }

    pub fn rows(&self, tab: BrowserTab) -> Vec<BrowserRow> {
        match tab {
            BrowserTab::Histories => self
                .histories
                .iter()
                .map(|history| BrowserRow::History {
                    id: history.id.clone(),
                    title: history.title.clone(),
                    last_message: history.last_message.clone(),
                    timestamp: history.timestamp,
                })
                .collect(),
            BrowserTab::Favorites => self
                .favorites
                .iter()
                .map(|message| BrowserRow::Favorite {
                    id: message.id.clone(),
                    text: message.text.clone(),
                    timestamp: message.timestamp,
                })
                .collect(),
        }
    }

    pub fn len(&self, tab: BrowserTab) -> usize {
        match tab {
            BrowserTab::Histories => self.histories.len(),
            BrowserTab::Favorites => self.favorites.len(),
        }
    }

    pub fn is_empty(&self, tab: BrowserTab) -> bool {
        self.len(tab) == 0
    }

    /// Returns the history id at `index` on the histories tab.
    ///
    /// Favorite rows are not restorable and yield `None`.
    pub fn select(&self, tab: BrowserTab, index: usize) -> Option<&str> {
        match tab {
            BrowserTab::Histories => self.histories.get(index).map(|h| h.id.as_str()),
            BrowserTab::Favorites => None,
        }
    }
}
