//! Editor capabilities the supervisor relies on.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Notifications, prompts and file opening provided by the host editor.
#[async_trait]
pub trait EditorHost: Send + Sync {
    /// Show an informational notice.
    fn show_information(&self, message: &str);

    /// Show an error notice.
    fn show_error(&self, message: &str);

    /// Ask the user to pick one of `choices`; `None` when dismissed.
    async fn show_choice(&self, message: &str, choices: &[&str]) -> Option<String>;

    /// Ask the user for free text; `None` when cancelled.
    async fn show_input(&self, prompt: &str, placeholder: &str) -> Option<String>;

    /// Open a file in the editor.
    async fn open_file(&self, path: &Path);
}

/// Something the supervisor asked the host to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Information(String),
    Error(String),
    Choice { message: String, choices: Vec<String> },
    Input { prompt: String, placeholder: String },
    OpenFile(PathBuf),
}

/// A host that records every interaction and replays queued answers.
///
/// Prompts with no queued answer are treated as dismissed.
#[derive(Debug, Default)]
pub struct RecordingHost {
    events: Mutex<Vec<HostEvent>>,
    choice_answers: Mutex<VecDeque<Option<String>>>,
    input_answers: Mutex<VecDeque<Option<String>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer for the next choice prompt.
    pub fn answer_choice(&self, answer: Option<&str>) {
        self.choice_answers
            .lock()
            .push_back(answer.map(str::to_string));
    }

    /// Queue the answer for the next input prompt.
    pub fn answer_input(&self, answer: Option<&str>) {
        self.input_answers
            .lock()
            .push_back(answer.map(str::to_string));
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().clone()
    }

    pub fn informations(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                HostEvent::Information(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                HostEvent::Error(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn opened_files(&self) -> Vec<PathBuf> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                HostEvent::OpenFile(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[async_trait]
impl EditorHost for RecordingHost {
    fn show_information(&self, message: &str) {
        self.events
            .lock()
            .push(HostEvent::Information(message.to_string()));
    }

    fn show_error(&self, message: &str) {
        self.events.lock().push(HostEvent::Error(message.to_string()));
    }

    async fn show_choice(&self, message: &str, choices: &[&str]) -> Option<String> {
        self.events.lock().push(HostEvent::Choice {
            message: message.to_string(),
            choices: choices.iter().map(|c| c.to_string()).collect(),
        });
        self.choice_answers.lock().pop_front().flatten()
    }

    async fn show_input(&self, prompt: &str, placeholder: &str) -> Option<String> {
        self.events.lock().push(HostEvent::Input {
            prompt: prompt.to_string(),
            placeholder: placeholder.to_string(),
        });
        self.input_answers.lock().pop_front().flatten()
    }

    async fn open_file(&self, path: &Path) {
        self.events
            .lock()
            .push(HostEvent::OpenFile(path.to_path_buf()));
    }
}
