//! VK API directory client
//!
//! Every call is a `GET {api_url}/method/{name}` carrying the access token
//! and API version. VK answers HTTP 200 with either `{"response": ...}` or
//! `{"error": {"error_code", "error_msg"}}`; the latter is classified into
//! [`DirectoryError`] so callers can pick a recovery policy.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use shared::{GroupId, GroupRef, MemberPage, UserId};
use crate::config::InviterConfig;
use crate::error::{DirectoryError, DirectoryResult};
use crate::traits::DirectoryClient;

/// Profile fields requested with every member page
pub const MEMBER_FIELDS: &str = "sex,bdate,city,last_seen,has_photo";

#[derive(Deserialize)]
struct ApiEnvelope<T> {
    response: Option<T>,
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error_code: i64,
    #[serde(default)]
    error_msg: String,
}

#[derive(Deserialize)]
struct GroupSummary {
    id: u64,
}

/// `groups.getById` returns a bare array up to API 5.139 and an object
/// with a `groups` array afterwards.
#[derive(Deserialize)]
#[serde(untagged)]
enum GroupsById {
    List(Vec<GroupSummary>),
    Wrapped { groups: Vec<GroupSummary> },
}

impl GroupsById {
    fn first(self) -> Option<GroupSummary> {
        match self {
            GroupsById::List(groups) | GroupsById::Wrapped { groups } => groups.into_iter().next(),
        }
    }
}

/// Real VK client over HTTPS
pub struct RealVkClient {
    client: reqwest::Client,
    api_url: String,
    access_token: String,
    api_version: String,
}

impl RealVkClient {
    /// Create a client against `api_url` (for example `https://api.vk.com`)
    pub fn new(api_url: impl Into<String>, access_token: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: api_version.into(),
        }
    }

    pub fn from_config(config: &InviterConfig) -> Self {
        Self::new(&config.api_url, &config.access_token, &config.api_version)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&str, String)]) -> DirectoryResult<T> {
        let url = format!("{}/method/{}", self.api_url, method);

        let response = self
            .client
            .get(&url)
            .query(&[("access_token", self.access_token.as_str()), ("v", self.api_version.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return match status.as_u16() {
                429 => Err(DirectoryError::RateLimited {
                    code: 429,
                    message: status.to_string(),
                }),
                _ => Err(DirectoryError::Network(format!("{method}: HTTP {status}"))),
            };
        }

        let envelope: ApiEnvelope<T> = response.json().await?;

        match (envelope.response, envelope.error) {
            (_, Some(error)) => Err(DirectoryError::from_api(error.error_code, error.error_msg)),
            (Some(response), None) => Ok(response),
            (None, None) => Err(DirectoryError::Malformed(format!(
                "{method}: neither response nor error in payload"
            ))),
        }
    }
}

#[async_trait]
impl DirectoryClient for RealVkClient {
    async fn resolve_group(&self, group: &GroupRef) -> DirectoryResult<GroupId> {
        let screen_name = match group {
            GroupRef::Id(id) => return Ok(*id),
            GroupRef::ScreenName(name) => name,
        };

        let groups: GroupsById = self
            .call("groups.getById", &[("group_id", screen_name.clone())])
            .await?;

        groups
            .first()
            .map(|summary| GroupId(summary.id))
            .ok_or_else(|| DirectoryError::Malformed(format!("no community named {screen_name}")))
    }

    async fn list_members(&self, group: GroupId, offset: u32, count: u32) -> DirectoryResult<MemberPage> {
        self.call(
            "groups.getMembers",
            &[
                ("group_id", group.0.to_string()),
                ("offset", offset.to_string()),
                ("count", count.to_string()),
                ("fields", MEMBER_FIELDS.to_string()),
            ],
        )
        .await
    }

    async fn is_member(&self, group: GroupId, user: UserId) -> DirectoryResult<bool> {
        let value: serde_json::Value = self
            .call(
                "groups.isMember",
                &[("group_id", group.0.to_string()), ("user_id", user.0.to_string())],
            )
            .await?;

        match value {
            serde_json::Value::Bool(flag) => Ok(flag),
            serde_json::Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
            // extended form: {"member": 1, ...}
            serde_json::Value::Object(map) => Ok(map
                .get("member")
                .and_then(|m| m.as_i64())
                .unwrap_or(0)
                != 0),
            other => Err(DirectoryError::Malformed(format!("groups.isMember returned {other}"))),
        }
    }

    async fn invite(&self, group: GroupId, user: UserId) -> DirectoryResult<()> {
        let _: serde_json::Value = self
            .call(
                "groups.invite",
                &[("group_id", group.0.to_string()), ("user_id", user.0.to_string())],
            )
            .await?;
        Ok(())
    }
}
