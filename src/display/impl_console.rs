use crate::capture_classifier::core::Event;
use crate::capture_classifier::render::{Screen, ViewModel};
use crate::display::interface::Display;
use std::error::Error;
use std::io::{BufRead, Write};
use std::sync::mpsc::Sender;
use std::sync::Mutex;

/// Prints the view whenever it changes. Input comes from stdin, see
/// [`spawn_command_reader`].
pub struct DisplayConsole {
    last_view: Mutex<Option<ViewModel>>,
}

impl DisplayConsole {
    pub fn new() -> Self {
        Self {
            last_view: Mutex::new(None),
        }
    }
}

pub fn format_view(view: &ViewModel) -> Vec<String> {
    match &view.screen {
        Screen::PermissionLoading => vec!["Loading".to_string()],
        Screen::PermissionRequest { requesting } => vec![
            "We need your permission to show the camera".to_string(),
            if *requesting {
                "Waiting for permission...".to_string()
            } else {
                "[p] grant permission".to_string()
            },
        ],
        Screen::Camera => {
            let mut lines = vec![];
            if let Some(thumbnail) = &view.thumbnail {
                lines.push(format!("photo: {}", thumbnail.uri));
            }
            lines.push(view.status_text.clone());
            if let Some(error) = &view.error {
                lines.push(format!("error: {}", error));
            }
            let mut commands = vec!["[c] take picture"];
            if view.can_retry() {
                commands.push("[r] retry");
            }
            lines.push(commands.join("  "));
            lines
        }
    }
}

pub fn parse_command(line: &str) -> Option<Event> {
    match line.trim().to_lowercase().as_str() {
        "p" | "permission" => Some(Event::RequestPermissionPressed),
        "c" | "capture" => Some(Event::CapturePressed),
        "r" | "retry" => Some(Event::RetryPressed),
        _ => None,
    }
}

/// Forwards stdin commands as events until stdin closes or the pipeline
/// stops listening.
pub fn spawn_command_reader(event_sender: Sender<Event>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if let Some(event) = parse_command(&line) {
                if event_sender.send(event).is_err() {
                    break;
                }
            }
        }
    })
}

impl Display for DisplayConsole {
    fn show(&self, view: &ViewModel) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut last_view = self
            .last_view
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if last_view.as_ref() == Some(view) {
            return Ok(());
        }

        let lines = format_view(view);
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);

        let mut out = std::io::stdout().lock();
        writeln!(out, "┌{}┐", "─".repeat(width + 2))?;
        for line in &lines {
            writeln!(
                out,
                "│ {}{} │",
                line,
                " ".repeat(width - line.chars().count())
            )?;
        }
        writeln!(out, "└{}┘", "─".repeat(width + 2))?;

        *last_view = Some(view.clone());
        Ok(())
    }
}
