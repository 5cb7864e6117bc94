//! Terminal stand-ins for the editor: notices on stdout, prompts on stdin.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tracker_supervisor::{EditorHost, StatusBarItem};

/// Lines read from stdin, shared by the command loop and the prompts.
pub struct InputLines {
    rx: tokio::sync::Mutex<mpsc::Receiver<String>>,
}

impl InputLines {
    /// Start reading stdin in the background.
    pub fn stdin() -> Arc<Self> {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Failed to read stdin");
                        break;
                    }
                }
            }
            debug!("stdin closed");
        });
        Arc::new(Self {
            rx: tokio::sync::Mutex::new(rx),
        })
    }

    /// Next trimmed line; `None` once stdin is closed.
    pub async fn next_line(&self) -> Option<String> {
        let line = self.rx.lock().await.recv().await?;
        Some(line.trim().to_string())
    }
}

pub struct TerminalHost {
    input: Arc<InputLines>,
}

impl TerminalHost {
    pub fn new(input: Arc<InputLines>) -> Self {
        Self { input }
    }
}

fn prompt(text: &str) {
    print!("{}", text);
    let _ = std::io::stdout().flush();
}

/// Match an answer against the offered choices, by 1-based index or by
/// case-insensitive name.
fn parse_choice(answer: &str, choices: &[&str]) -> Option<String> {
    if let Ok(index) = answer.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| choices.get(i))
            .map(|c| c.to_string());
    }
    choices
        .iter()
        .find(|c| c.eq_ignore_ascii_case(answer))
        .map(|c| c.to_string())
}

fn opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

#[async_trait]
impl EditorHost for TerminalHost {
    fn show_information(&self, message: &str) {
        println!("{}", message);
    }

    fn show_error(&self, message: &str) {
        eprintln!("error: {}", message);
    }

    async fn show_choice(&self, message: &str, choices: &[&str]) -> Option<String> {
        let options: Vec<String> = choices
            .iter()
            .enumerate()
            .map(|(i, c)| format!("[{}] {}", i + 1, c))
            .collect();
        prompt(&format!("{} {}: ", message, options.join(" ")));
        let answer = self.input.next_line().await?;
        parse_choice(&answer, choices)
    }

    async fn show_input(&self, prompt_text: &str, placeholder: &str) -> Option<String> {
        prompt(&format!("{} ({}): ", prompt_text, placeholder));
        self.input.next_line().await.filter(|l| !l.is_empty())
    }

    async fn open_file(&self, path: &Path) {
        println!("Opening {}", path.display());
        match tokio::process::Command::new(opener()).arg(path).spawn() {
            Ok(mut child) => {
                if let Err(e) = child.wait().await {
                    warn!(error = %e, path = %path.display(), "File opener failed");
                }
            }
            Err(e) => warn!(error = %e, path = %path.display(), "Could not open file"),
        }
    }
}

/// Prints the status text whenever it changes.
#[derive(Default)]
pub struct TerminalStatusBar {
    text: Mutex<String>,
}

impl TerminalStatusBar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusBarItem for TerminalStatusBar {
    fn set_text(&self, text: &str) {
        let mut current = self.text.lock();
        if *current != text {
            *current = text.to_string();
            println!("[{}]", text);
        }
    }

    fn set_command(&self, command: Option<&str>) {
        debug!(command = ?command, "Status command");
    }

    fn set_tooltip(&self, tooltip: &str) {
        debug!(tooltip, "Status tooltip");
    }
}
