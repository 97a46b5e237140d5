use serde::{Deserialize, Serialize};

use crate::domain::RelationshipStatus;

pub const DEFAULT_API_PREFIX: &str = "/api/v1.0";

/// Relation collections exposed under `{prefix}/relations/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationResource {
    Friends,
    Invitations,
}

impl RelationResource {
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Friends => "friends",
            Self::Invitations => "invitations",
        }
    }
}

/// Value of the `action` query parameter on `DELETE invitations/{user}`.
///
/// `Remove` withdraws an invitation the viewer sent; `Reject` declines one the
/// viewer received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationAction {
    Remove,
    Reject,
}

impl InvitationAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remove => "remove",
            Self::Reject => "reject",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationActionQuery {
    pub action: InvitationAction,
}

/// Body of the status endpoint. The relations API answers with a bare enum
/// string; the users API wraps it in `{"status": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusPayload {
    Bare(RelationshipStatus),
    Wrapped { status: RelationshipStatus },
}

impl StatusPayload {
    pub fn status(&self) -> RelationshipStatus {
        match self {
            Self::Bare(status) | Self::Wrapped { status } => *status,
        }
    }
}
