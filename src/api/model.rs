use crate::solver::ChallengeRequest;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChallengePayload {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ChallengeRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ChallengeResponse>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct ChallengeResponse {
    pub uid: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct Status {
    pub message: String,
}

impl ChallengeResponse {
    pub fn success(uid: String) -> Self {
        ChallengeResponse {
            uid,
            success: true,
            status: None,
        }
    }

    pub fn failure(uid: String, message: String) -> Self {
        ChallengeResponse {
            uid,
            success: false,
            status: Some(Status { message }),
        }
    }
}
