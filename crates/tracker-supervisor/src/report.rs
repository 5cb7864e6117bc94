//! User-facing reporting shared by both tracker controllers.

use crate::format::{format_emissions, DEFAULT_DECIMALS};
use crate::EditorHost;
use std::path::Path;
use tracing::info;

pub const ALREADY_RUNNING: &str = "CodeCarbon tracker is already running.";
pub const NO_EMISSIONS: &str = "CodeCarbon tracker stopped. No emissions detected.";
pub const OPEN_CHOICE: &str = "Open";
pub const CANCEL_CHOICE: &str = "Cancel";

pub fn emissions_message(value: f64) -> String {
    format!(
        "CodeCarbon tracker stopped. Emissions: ~ {}.",
        format_emissions(value, DEFAULT_DECIMALS)
    )
}

pub fn emissions_file_message(path: &str) -> String {
    format!("Emissions file: {}", path)
}

pub fn spawn_failure_message(error: &dyn std::fmt::Display) -> String {
    format!("Failed to start CodeCarbon tracker: {}", error)
}

pub fn request_failure_message(error: &dyn std::fmt::Display) -> String {
    format!("CodeCarbon tracker request failed: {}", error)
}

/// Whether a measured value is worth reporting. Absent, zero and
/// non-finite values all mean "no emissions".
pub fn is_reportable(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v.is_finite() && v != 0.0)
}

/// Notify the user of a measured value. Returns whether it was reportable.
pub fn report_emissions(host: &dyn EditorHost, value: Option<f64>) -> bool {
    match value {
        Some(v) if is_reportable(Some(v)) => {
            info!(emissions = v, "Emissions reported");
            host.show_information(&emissions_message(v));
            true
        }
        _ => {
            host.show_information(NO_EMISSIONS);
            false
        }
    }
}

/// Offer to open the emissions report file.
pub async fn offer_emissions_file(host: &dyn EditorHost, path: &str) {
    let selection = host
        .show_choice(&emissions_file_message(path), &[OPEN_CHOICE, CANCEL_CHOICE])
        .await;
    if selection.as_deref() == Some(OPEN_CHOICE) {
        host.open_file(Path::new(path)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HostEvent, RecordingHost};
    use std::path::PathBuf;

    #[test]
    fn messages() {
        assert_eq!(
            emissions_message(0.5),
            "CodeCarbon tracker stopped. Emissions: ~ 0.50 kgCO2e."
        );
        assert_eq!(
            emissions_message(0.0001),
            "CodeCarbon tracker stopped. Emissions: ~ 1.00e-4 kgCO2e."
        );
        assert_eq!(emissions_file_message("/tmp/out.csv"), "Emissions file: /tmp/out.csv");
        assert_eq!(
            spawn_failure_message(&"No such file or directory"),
            "Failed to start CodeCarbon tracker: No such file or directory"
        );
    }

    #[test]
    fn unreportable_values() {
        let host = RecordingHost::new();
        for value in [None, Some(0.0), Some(f64::NAN), Some(f64::INFINITY)] {
            assert!(!report_emissions(&host, value));
        }
        assert_eq!(host.informations(), vec![NO_EMISSIONS; 4]);
    }

    #[test]
    fn reportable_value() {
        let host = RecordingHost::new();
        assert!(report_emissions(&host, Some(0.5)));
        assert_eq!(
            host.informations(),
            vec!["CodeCarbon tracker stopped. Emissions: ~ 0.50 kgCO2e."]
        );
    }

    #[tokio::test]
    async fn open_choice_opens_file() {
        let host = RecordingHost::new();
        host.answer_choice(Some(OPEN_CHOICE));
        offer_emissions_file(&host, "/tmp/out.csv").await;

        assert_eq!(
            host.events(),
            vec![
                HostEvent::Choice {
                    message: "Emissions file: /tmp/out.csv".into(),
                    choices: vec!["Open".into(), "Cancel".into()],
                },
                HostEvent::OpenFile(PathBuf::from("/tmp/out.csv")),
            ]
        );
    }

    #[tokio::test]
    async fn cancel_or_dismiss_does_nothing() {
        let host = RecordingHost::new();
        host.answer_choice(Some(CANCEL_CHOICE));
        offer_emissions_file(&host, "/tmp/out.csv").await;
        offer_emissions_file(&host, "/tmp/out.csv").await;
        assert!(host.opened_files().is_empty());
    }
}
