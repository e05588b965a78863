//! HistoryWriter - append-only narration of user-visible events

use serde::{Deserialize, Serialize};

/// One narrated event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub id: u64,
    pub text: String,
}

/// The history sink battles narrate into
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryWriter {
    events: Vec<HistoryEvent>,
    next_event_id: u64,
}

impl HistoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a narration event and return its id
    pub fn start_event(&mut self, text: impl Into<String>) -> u64 {
        let text = text.into();
        tracing::info!("{text}");
        let id = self.next_event_id;
        self.next_event_id += 1;
        self.events.push(HistoryEvent { id, text });
        id
    }

    pub fn events(&self) -> &[HistoryEvent] {
        &self.events
    }

    /// Render the whole narration as one newline-joined summary
    pub fn render(&self) -> String {
        self.events
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
