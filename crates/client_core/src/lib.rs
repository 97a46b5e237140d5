use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use shared::domain::{Profile, RelationshipStatus, Username};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

pub mod action;
pub mod api;
pub mod config;
pub mod error;
pub mod events;

pub use action::{plan_for_status, ActionSpec, HttpMethod, StatusPlan};
pub use api::{HttpRelationshipApi, RelationshipApi};
pub use config::ClientSettings;
pub use error::{ApiCallError, ControllerError};
pub use events::{ControllerEvent, RelationshipView};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Refuse a second mutating call while one is still pending. Off by
    /// default: rapid repeated clicks each reach the server.
    pub serialize_actions: bool,
}

impl From<&ClientSettings> for ControllerOptions {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            serialize_actions: settings.serialize_actions,
        }
    }
}

/// Outcome of a mutating action and the status read that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub action: ActionSpec,
    pub mutation_error: Option<String>,
    pub refreshed_status: Option<RelationshipStatus>,
}

impl ActionReport {
    pub fn mutation_succeeded(&self) -> bool {
        self.mutation_error.is_none()
    }
}

#[derive(Default)]
struct ControllerState {
    staged: Option<ActionSpec>,
    view: RelationshipView,
}

/// Holds the in-flight flag for one action. Dropping it, including when the
/// action future is abandoned, releases the flag.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives the relationship control of one viewed profile.
///
/// The server owns the relationship state. The controller never predicts the
/// next status: every action is followed by a fresh read, and the staged
/// action is only ever derived from the latest read.
pub struct RelationshipController {
    api: Arc<dyn RelationshipApi>,
    target: Username,
    options: ControllerOptions,
    inner: Mutex<ControllerState>,
    action_in_flight: AtomicBool,
    events: broadcast::Sender<ControllerEvent>,
}

impl RelationshipController {
    pub fn new(api: Arc<dyn RelationshipApi>, target: Username) -> Self {
        Self::with_options(api, target, ControllerOptions::default())
    }

    pub fn with_options(
        api: Arc<dyn RelationshipApi>,
        target: Username,
        options: ControllerOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            target,
            options,
            inner: Mutex::new(ControllerState::default()),
            action_in_flight: AtomicBool::new(false),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn view(&self) -> RelationshipView {
        self.inner.lock().await.view.clone()
    }

    pub async fn staged_action(&self) -> Option<ActionSpec> {
        self.inner.lock().await.staged
    }

    /// Loads the profile and the relationship status side by side. A missing
    /// profile is logged only; the status result is returned.
    pub async fn init(&self) -> Result<RelationshipStatus, ControllerError> {
        let (profile, status) = futures::join!(self.fetch_profile(), self.refresh_status());
        if let Err(err) = profile {
            warn!(username = %self.target, error = %err, "relations: profile unavailable");
        }
        status
    }

    pub async fn fetch_profile(&self) -> Result<Profile, ControllerError> {
        let profile = self
            .api
            .fetch_profile(&self.target)
            .await
            .map_err(ControllerError::ProfileUnavailable)?;
        self.inner.lock().await.view.profile = Some(profile.clone());
        self.emit(ControllerEvent::ProfileLoaded(profile.clone()));
        Ok(profile)
    }

    pub async fn refresh_status(&self) -> Result<RelationshipStatus, ControllerError> {
        match self.api.fetch_status(&self.target).await {
            Ok(status) => {
                let plan = plan_for_status(status);
                {
                    let mut guard = self.inner.lock().await;
                    if guard.view.region_removed {
                        debug!(
                            username = %self.target,
                            status = %status,
                            "relations: status ignored; controls already removed"
                        );
                        return Ok(status);
                    }
                    guard.staged = Some(plan.action);
                    guard.view.apply_plan(&plan);
                }
                info!(
                    username = %self.target,
                    status = %status,
                    label = plan.button_label,
                    "relations: status resolved"
                );
                self.emit(ControllerEvent::StatusResolved(plan));
                Ok(status)
            }
            Err(err) => {
                {
                    let mut guard = self.inner.lock().await;
                    guard.staged = None;
                    guard.view.remove_region();
                }
                warn!(
                    username = %self.target,
                    error = %err,
                    "relations: status unavailable; removing relationship controls"
                );
                self.emit(ControllerEvent::RegionRemoved {
                    reason: err.to_string(),
                });
                Err(ControllerError::StatusUnavailable(err))
            }
        }
    }

    /// Runs the staged action, then re-reads the status whatever the outcome.
    ///
    /// A failed mutation is not returned as an error: the follow-up read shows
    /// the unchanged state, and the failure is reported in the
    /// [`ActionReport`].
    pub async fn perform_action(&self) -> Result<ActionReport, ControllerError> {
        let (action, _in_flight) = self
            .begin_action(|state| state.staged.ok_or(ControllerError::NoActionStaged))
            .await?;
        Ok(self.run_action(action).await)
    }

    pub async fn reject_invitation(&self) -> Result<ActionReport, ControllerError> {
        let (action, _in_flight) = self
            .begin_action(|state| {
                if state.view.status == Some(RelationshipStatus::InvitationToYou)
                    && state.view.reject_visible
                {
                    Ok(ActionSpec::reject())
                } else {
                    Err(ControllerError::RejectUnavailable)
                }
            })
            .await?;
        Ok(self.run_action(action).await)
    }

    async fn begin_action(
        &self,
        select: impl FnOnce(&ControllerState) -> Result<ActionSpec, ControllerError>,
    ) -> Result<(ActionSpec, Option<InFlightGuard<'_>>), ControllerError> {
        let guard = self.inner.lock().await;
        if guard.view.region_removed {
            return Err(ControllerError::RegionRemoved);
        }
        let action = select(&*guard)?;
        if !self.options.serialize_actions {
            return Ok((action, None));
        }
        if self
            .action_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ControllerError::ActionInFlight);
        }
        Ok((action, Some(InFlightGuard(&self.action_in_flight))))
    }

    async fn run_action(&self, action: ActionSpec) -> ActionReport {
        info!(
            username = %self.target,
            method = action.method.as_str(),
            resource = action.resource.path_segment(),
            "relations: dispatching action"
        );
        self.emit(ControllerEvent::ActionDispatched(action));

        let mutation_error = match self.api.execute(&self.target, &action).await {
            Ok(()) => {
                if action.hides_reject_control() {
                    self.hide_reject_control().await;
                }
                None
            }
            Err(err) => {
                // Not propagated; the refresh below shows the unchanged state.
                warn!(
                    username = %self.target,
                    method = action.method.as_str(),
                    resource = action.resource.path_segment(),
                    error = %err,
                    "relations: action failed; resynchronising"
                );
                let error = err.to_string();
                self.emit(ControllerEvent::ActionFailed {
                    action,
                    error: error.clone(),
                });
                Some(error)
            }
        };

        let refreshed_status = self.refresh_status().await.ok();

        ActionReport {
            action,
            mutation_error,
            refreshed_status,
        }
    }

    async fn hide_reject_control(&self) {
        let was_visible = {
            let mut guard = self.inner.lock().await;
            std::mem::replace(&mut guard.view.reject_visible, false)
        };
        if was_visible {
            self.emit(ControllerEvent::RejectControlHidden);
        }
    }

    fn emit(&self, event: ControllerEvent) {
        // No subscribers is fine; the view may not be attached yet.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
