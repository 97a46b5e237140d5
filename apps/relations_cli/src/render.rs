//! Terminal rendering of controller events and the relationship view.

use client_core::{
    action::LABEL_REJECT_INVITATION, ActionReport, ActionSpec, ControllerEvent, RelationshipView,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

pub async fn print_events(mut events: broadcast::Receiver<ControllerEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => println!("{}", describe(&event)),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "relations: view missed events"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn describe_action(action: &ActionSpec) -> String {
    match action.action {
        Some(param) => format!(
            "{} {}?action={}",
            action.method.as_str(),
            action.resource.path_segment(),
            param.as_str()
        ),
        None => format!(
            "{} {}",
            action.method.as_str(),
            action.resource.path_segment()
        ),
    }
}

pub fn describe(event: &ControllerEvent) -> String {
    match event {
        ControllerEvent::ProfileLoaded(profile) => format!(
            "profile: {} <{}>, {} friend(s)",
            profile.username, profile.email, profile.number_of_friends
        ),
        ControllerEvent::StatusResolved(plan) => {
            format!("status: {} -> [{}]", plan.status, plan.button_label)
        }
        ControllerEvent::ActionDispatched(action) => {
            format!("sending: {}", describe_action(action))
        }
        ControllerEvent::ActionFailed { action, error } => {
            format!("failed: {} ({error})", describe_action(action))
        }
        ControllerEvent::RejectControlHidden => format!("hidden: [{LABEL_REJECT_INVITATION}]"),
        ControllerEvent::RegionRemoved { reason } => {
            format!("relationship controls removed: {reason}")
        }
    }
}

pub fn format_view(view: &RelationshipView) -> String {
    if !view.control_visible() {
        return "relationship: not available".to_string();
    }

    let mut buttons = Vec::new();
    if let Some(label) = view.button_label {
        buttons.push(format!("[{label}]"));
    }
    if view.reject_visible {
        buttons.push(format!("[{LABEL_REJECT_INVITATION}]"));
    }

    let status = view
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!("relationship: {status} {}", buttons.join(" "))
}

pub fn format_report(report: &ActionReport) -> String {
    let refreshed = report
        .refreshed_status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unavailable".to_string());
    match &report.mutation_error {
        None => format!("{}: ok, now {refreshed}", describe_action(&report.action)),
        Some(error) => format!(
            "{}: failed ({error}), still {refreshed}",
            describe_action(&report.action)
        ),
    }
}
