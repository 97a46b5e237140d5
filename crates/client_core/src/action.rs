//! Pure mapping from a relationship status to the button and request it stages.

use shared::{
    domain::RelationshipStatus,
    protocol::{InvitationAction, RelationResource},
};

pub const LABEL_REMOVE_FRIEND: &str = "Remove from friends!";
pub const LABEL_REMOVE_INVITATION: &str = "Remove invitation!";
pub const LABEL_ACCEPT_INVITATION: &str = "Accept the invitation!";
pub const LABEL_ADD_FRIEND: &str = "Add to friends!";
pub const LABEL_REJECT_INVITATION: &str = "Reject invitation!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

/// The next mutating call to issue against the relations API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionSpec {
    pub resource: RelationResource,
    pub method: HttpMethod,
    pub action: Option<InvitationAction>,
}

impl ActionSpec {
    pub const fn new(resource: RelationResource, method: HttpMethod) -> Self {
        Self {
            resource,
            method,
            action: None,
        }
    }

    pub const fn with_action(mut self, action: InvitationAction) -> Self {
        self.action = Some(action);
        self
    }

    pub const fn reject() -> Self {
        Self::new(RelationResource::Invitations, HttpMethod::Delete)
            .with_action(InvitationAction::Reject)
    }

    /// Accepting an invitation is the only POST against the friends collection.
    pub fn is_accept(&self) -> bool {
        self.resource == RelationResource::Friends && self.method == HttpMethod::Post
    }

    pub fn is_reject(&self) -> bool {
        self.action == Some(InvitationAction::Reject)
    }

    /// Accept and reject both retire the reject control.
    pub fn hides_reject_control(&self) -> bool {
        self.is_accept() || self.is_reject()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPlan {
    pub status: RelationshipStatus,
    pub button_label: &'static str,
    pub action: ActionSpec,
    pub show_reject: bool,
}

pub fn plan_for_status(status: RelationshipStatus) -> StatusPlan {
    let (button_label, action) = match status {
        RelationshipStatus::Friend => (
            LABEL_REMOVE_FRIEND,
            ActionSpec::new(RelationResource::Friends, HttpMethod::Delete),
        ),
        RelationshipStatus::InvitationFromYou => (
            LABEL_REMOVE_INVITATION,
            ActionSpec::new(RelationResource::Invitations, HttpMethod::Delete)
                .with_action(InvitationAction::Remove),
        ),
        RelationshipStatus::InvitationToYou => (
            LABEL_ACCEPT_INVITATION,
            ActionSpec::new(RelationResource::Friends, HttpMethod::Post),
        ),
        RelationshipStatus::Unknown => (
            LABEL_ADD_FRIEND,
            ActionSpec::new(RelationResource::Invitations, HttpMethod::Post),
        ),
    };

    StatusPlan {
        status,
        button_label,
        action,
        show_reject: status == RelationshipStatus::InvitationToYou,
    }
}

#[cfg(test)]
#[path = "tests/action_tests.rs"]
mod tests;
