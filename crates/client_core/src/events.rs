//! Controller events and the view projection the rendering layer applies.

use shared::domain::{Profile, RelationshipStatus};

use crate::action::{ActionSpec, StatusPlan};

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    ProfileLoaded(Profile),
    StatusResolved(StatusPlan),
    ActionDispatched(ActionSpec),
    ActionFailed { action: ActionSpec, error: String },
    RejectControlHidden,
    RegionRemoved { reason: String },
}

/// What the relationship region should currently display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipView {
    pub status: Option<RelationshipStatus>,
    pub button_label: Option<&'static str>,
    pub authorised_user: bool,
    pub reject_visible: bool,
    pub region_removed: bool,
    pub profile: Option<Profile>,
}

impl RelationshipView {
    pub fn control_visible(&self) -> bool {
        self.authorised_user && !self.region_removed
    }

    pub(crate) fn apply_plan(&mut self, plan: &StatusPlan) {
        self.status = Some(plan.status);
        self.button_label = Some(plan.button_label);
        self.reject_visible = plan.show_reject;
        self.authorised_user = true;
    }

    // Removal is permanent for the page; later reads never bring the region back.
    pub(crate) fn remove_region(&mut self) {
        self.status = None;
        self.button_label = None;
        self.reject_visible = false;
        self.authorised_user = false;
        self.region_removed = true;
    }
}
