//! Scripted VK API served through wiremock

use std::collections::{HashMap, HashSet};

use serde_json::{json, Value};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use shared::MemberRecord;

/// Answers `groups.*` calls from in-memory data
#[derive(Clone, Default)]
pub struct FakeVk {
    /// Members of the target community, in listing order
    pub members: Vec<MemberRecord>,
    /// Users already in the destination community
    pub destination_members: HashSet<u64>,
    /// `groups.invite` answers by user id; missing users succeed
    pub invite_errors: HashMap<u64, (i64, String)>,
    /// `groups.getById` answers by screen name
    pub screen_names: HashMap<String, u64>,
}

impl FakeVk {
    pub fn with_members(members: Vec<MemberRecord>) -> Self {
        Self {
            members,
            ..Default::default()
        }
    }

    pub fn already_in_destination(mut self, ids: &[u64]) -> Self {
        self.destination_members.extend(ids);
        self
    }

    pub fn invite_fails(mut self, user: u64, code: i64, message: &str) -> Self {
        self.invite_errors.insert(user, (code, message.to_string()));
        self
    }

    pub fn screen_name(mut self, name: &str, id: u64) -> Self {
        self.screen_names.insert(name.to_string(), id);
        self
    }

    /// Start a server answering every GET with this script
    pub async fn serve(self) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(self).mount(&server).await;
        server
    }

    fn members_page(&self, params: &HashMap<String, String>) -> Value {
        let offset = number(params, "offset");
        let count = number(params, "count");
        let items: Vec<&MemberRecord> = self.members.iter().skip(offset).take(count).collect();
        json!({ "response": { "count": self.members.len(), "items": items } })
    }

    fn membership(&self, params: &HashMap<String, String>) -> Value {
        let user = number(params, "user_id") as u64;
        json!({ "response": u8::from(self.destination_members.contains(&user)) })
    }

    fn invitation(&self, params: &HashMap<String, String>) -> Value {
        let user = number(params, "user_id") as u64;
        match self.invite_errors.get(&user) {
            Some((code, message)) => json!({ "error": { "error_code": code, "error_msg": message } }),
            None => json!({ "response": 1 }),
        }
    }

    fn group_by_name(&self, params: &HashMap<String, String>) -> Value {
        let name = params.get("group_id").cloned().unwrap_or_default();
        match self.screen_names.get(&name) {
            Some(id) => json!({ "response": [{ "id": id, "screen_name": name }] }),
            None => json!({ "error": { "error_code": 100, "error_msg": "group_id is undefined" } }),
        }
    }
}

impl Respond for FakeVk {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let params: HashMap<String, String> = request.url.query_pairs().into_owned().collect();
        let body = match request.url.path() {
            "/method/groups.getMembers" => self.members_page(&params),
            "/method/groups.isMember" => self.membership(&params),
            "/method/groups.invite" => self.invitation(&params),
            "/method/groups.getById" => self.group_by_name(&params),
            _ => return ResponseTemplate::new(404),
        };
        ResponseTemplate::new(200).set_body_json(body)
    }
}

fn number(params: &HashMap<String, String>, key: &str) -> usize {
    params.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
}

/// User ids of every `groups.invite` call the server saw, in order
pub async fn invited_users(server: &MockServer) -> Vec<u64> {
    requests_to(server, "groups.invite")
        .await
        .iter()
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "user_id")
                .and_then(|(_, value)| value.parse().ok())
        })
        .collect()
}

/// Requests the server saw for one API method
pub async fn requests_to(server: &MockServer, api_method: &str) -> Vec<Request> {
    let path = format!("/method/{api_method}");
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == path)
        .collect()
}
