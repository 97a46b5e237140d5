use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ApiException, ErrorCode};

/// Name of the user whose profile is being viewed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ApiException> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ApiException::new(
                ErrorCode::Validation,
                "username must not be empty",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Relationship between the signed-in viewer and a target user, as computed
/// by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipStatus {
    Friend,
    InvitationFromYou,
    InvitationToYou,
    Unknown,
}

impl RelationshipStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Friend => "FRIEND",
            Self::InvitationFromYou => "INVITATION_FROM_YOU",
            Self::InvitationToYou => "INVITATION_TO_YOU",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_src: Option<String>,
    pub number_of_friends: u32,
}
