use std::fmt::Write as _;

use colored::Colorize;

use lib_sync::{NotificationMessage, NotificationSink, NotificationSource, PublishOutcome, ViewSnapshot};

/// Prints toasts straight to stdout.
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn push(&self, message: NotificationMessage) {
        println!("\n{}", toast(&message));
    }
}

pub fn toast(message: &NotificationMessage) -> String {
    let origin = match message.source {
        NotificationSource::Poll => "notification",
        NotificationSource::Publish => "publish",
    };
    format!(
        "{} {} {}",
        message.received_at.format("%H:%M:%S").to_string().dimmed(),
        format!("[{origin}]").yellow().bold(),
        message.text
    )
}

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

pub fn snapshot(view: &ViewSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Current state".bold().underline());
    let _ = writeln!(out, "  vehicle            {}", or_dash(view.selected_vehicle_id.as_ref().map(|id| id.to_string())));
    let _ = writeln!(out, "  user               {}", or_dash(view.selected_user_id.as_ref().map(|id| id.to_string())));
    let _ = writeln!(out, "  mileage input      {}", view.mileage_input);
    let _ = writeln!(out, "  efficiency target  {}", or_dash(view.efficiency_target.map(|t| t.to_string())));
    let _ = writeln!(out, "  average mileage    {}", or_dash(view.average_mileage.clone()));
    let _ = write!(out, "  last publish       {}", or_dash(view.notification_text.clone()));
    out
}

pub fn vehicles(view: &ViewSnapshot) -> String {
    if view.vehicles.is_empty() {
        return "no vehicles available".dimmed().to_string();
    }
    view.vehicles
        .iter()
        .map(|v| {
            let marker = if view.selected_vehicle_id.as_ref() == Some(&v.id) { "*" } else { " " };
            format!("{marker} {:<12} {}", v.id.to_string().cyan(), v.display_name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn users(view: &ViewSnapshot) -> String {
    if view.selected_vehicle_id.is_none() {
        return "select a vehicle first".dimmed().to_string();
    }
    if view.users.is_empty() {
        return "no users for this vehicle".dimmed().to_string();
    }
    view.users
        .iter()
        .map(|u| {
            let marker = if view.selected_user_id.as_ref() == Some(&u.id) { "*" } else { " " };
            format!("{marker} {:<12} {}", u.id.to_string().cyan(), u.display_name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn publish_summary(outcomes: &[PublishOutcome]) -> String {
    let acknowledged = outcomes
        .iter()
        .filter(|o| matches!(o, PublishOutcome::Acknowledged { .. }))
        .count();
    let cancelled = outcomes
        .iter()
        .filter(|o| matches!(o, PublishOutcome::Cancelled { .. }))
        .count();
    let failed = outcomes.len() - acknowledged - cancelled;

    let summary = format!("publish finished: {acknowledged}/{} acknowledged", outcomes.len());
    match (failed, cancelled) {
        (0, 0) => summary.green().to_string(),
        _ => format!("{summary}, {failed} failed, {cancelled} cancelled").red().to_string(),
    }
}

pub fn success(text: &str) -> String {
    text.green().to_string()
}

pub fn failure(text: &str) -> String {
    text.red().to_string()
}
