//! Core shared types and identifiers

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::SharedError;

/// VK user (account) identifier
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Numeric VK community identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "club{}", self.0)
    }
}

/// A community as named by the operator: either already numeric or a
/// screen name that still has to be resolved through the API.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupRef {
    Id(GroupId),
    ScreenName(String),
}

impl GroupRef {
    /// Numeric id when no API lookup is needed
    pub fn as_id(&self) -> Option<GroupId> {
        match self {
            GroupRef::Id(id) => Some(*id),
            GroupRef::ScreenName(_) => None,
        }
    }
}

impl fmt::Display for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupRef::Id(id) => write!(f, "{id}"),
            GroupRef::ScreenName(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for GroupRef {
    type Err = SharedError;

    /// Accepts `12345`, `-12345`, `club12345`, `public12345`, `event12345`,
    /// `https://vk.com/<name>` and bare screen names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut value = s.trim();
        for scheme in ["https://", "http://"] {
            if let Some(rest) = value.strip_prefix(scheme) {
                value = rest;
            }
        }
        for host in ["www.vk.com/", "m.vk.com/", "vk.com/"] {
            if let Some(rest) = value.strip_prefix(host) {
                value = rest;
            }
        }
        let value = value.trim_end_matches('/');
        let value = value.strip_prefix('-').unwrap_or(value);

        if value.is_empty() {
            return Err(SharedError::InvalidGroupRef { input: s.to_string() });
        }

        if let Ok(id) = value.parse::<u64>() {
            return Ok(GroupRef::Id(GroupId(id)));
        }

        for prefix in ["club", "public", "event"] {
            if let Some(digits) = value.strip_prefix(prefix) {
                if let Ok(id) = digits.parse::<u64>() {
                    return Ok(GroupRef::Id(GroupId(id)));
                }
            }
        }

        if value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
            Ok(GroupRef::ScreenName(value.to_string()))
        } else {
            Err(SharedError::InvalidGroupRef { input: s.to_string() })
        }
    }
}

/// City reference attached to a profile
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Last time the account was online
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastSeen {
    /// Unix timestamp, seconds
    pub time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<u8>,
}

/// One entry of a community member listing. Every profile field is
/// optional: closed or deleted accounts return little more than the id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: UserId,
    /// 1 = female, 2 = male, 0 = unspecified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<u8>,
    /// `D.M.YYYY`, or `D.M` when the year is hidden
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bdate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<City>,
    #[serde(default, deserialize_with = "flag_from_int_or_bool", skip_serializing_if = "Option::is_none")]
    pub has_photo: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<LastSeen>,
}

impl MemberRecord {
    pub fn new(id: u64) -> Self {
        Self {
            id: UserId(id),
            ..Default::default()
        }
    }

    pub fn with_sex(mut self, sex: u8) -> Self {
        self.sex = Some(sex);
        self
    }

    pub fn with_bdate(mut self, bdate: &str) -> Self {
        self.bdate = Some(bdate.to_string());
        self
    }

    pub fn with_city(mut self, city_id: u64) -> Self {
        self.city = Some(City { id: city_id, title: None });
        self
    }

    pub fn with_photo(mut self, has_photo: bool) -> Self {
        self.has_photo = Some(has_photo);
        self
    }

    pub fn with_last_seen(mut self, time: i64) -> Self {
        self.last_seen = Some(LastSeen { time, platform: None });
        self
    }
}

/// One page of `groups.getMembers`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberPage {
    /// Total number of members in the community, not in this page
    pub count: u64,
    #[serde(default)]
    pub items: Vec<MemberRecord>,
}

/// Name attached to every log line of a running agent
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Label for an agent moving members from `source` into `destination`
    pub fn for_groups(source: &GroupRef, destination: &GroupRef) -> Self {
        Self(format!("inviter[{source}->{destination}]"))
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// VK sends flags as 0/1; some endpoints and hand-written fixtures use booleans.
/// Only exactly 1 counts as set.
fn flag_from_int_or_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(value) => value,
        Flag::Int(value) => value == 1,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_ref_numeric_forms() {
        assert_eq!("12345".parse::<GroupRef>().unwrap(), GroupRef::Id(GroupId(12345)));
        assert_eq!("-12345".parse::<GroupRef>().unwrap(), GroupRef::Id(GroupId(12345)));
        assert_eq!("club777".parse::<GroupRef>().unwrap(), GroupRef::Id(GroupId(777)));
        assert_eq!("public42".parse::<GroupRef>().unwrap(), GroupRef::Id(GroupId(42)));
        assert_eq!("https://vk.com/club99/".parse::<GroupRef>().unwrap(), GroupRef::Id(GroupId(99)));
    }

    #[test]
    fn test_group_ref_screen_names() {
        assert_eq!(
            "https://vk.com/rust_lang".parse::<GroupRef>().unwrap(),
            GroupRef::ScreenName("rust_lang".to_string())
        );
        // `club` followed by letters is a screen name, not an id
        assert_eq!(
            "clubhouse".parse::<GroupRef>().unwrap(),
            GroupRef::ScreenName("clubhouse".to_string())
        );
        assert!("".parse::<GroupRef>().is_err());
        assert!("bad name!".parse::<GroupRef>().is_err());
    }

    #[test]
    fn test_member_record_decodes_sparse_profile() {
        let json = serde_json::json!({
            "id": 10,
            "first_name": "Deleted",
            "deactivated": "deleted"
        });
        let member: MemberRecord = serde_json::from_value(json).unwrap();
        assert_eq!(member, MemberRecord::new(10));
    }

    #[test]
    fn test_member_record_decodes_full_profile() {
        let json = serde_json::json!({
            "id": 11,
            "sex": 1,
            "bdate": "15.3.1990",
            "city": {"id": 2, "title": "Saint Petersburg"},
            "has_photo": 1,
            "last_seen": {"time": 1_700_000_000, "platform": 7}
        });
        let member: MemberRecord = serde_json::from_value(json).unwrap();
        assert_eq!(member.sex, Some(1));
        assert_eq!(member.bdate.as_deref(), Some("15.3.1990"));
        assert_eq!(member.city.as_ref().map(|c| c.id), Some(2));
        assert_eq!(member.has_photo, Some(true));
        assert_eq!(member.last_seen.as_ref().map(|l| l.time), Some(1_700_000_000));
    }

    #[test]
    fn test_has_photo_accepts_booleans_and_zero() {
        let with_bool: MemberRecord = serde_json::from_str(r#"{"id":1,"has_photo":true}"#).unwrap();
        let with_zero: MemberRecord = serde_json::from_str(r#"{"id":1,"has_photo":0}"#).unwrap();
        assert_eq!(with_bool.has_photo, Some(true));
        assert_eq!(with_zero.has_photo, Some(false));
    }

    #[test]
    fn test_has_photo_other_integers_are_unset() {
        let with_two: MemberRecord = serde_json::from_str(r#"{"id":1,"has_photo":2}"#).unwrap();
        let negative: MemberRecord = serde_json::from_str(r#"{"id":1,"has_photo":-1}"#).unwrap();
        assert_eq!(with_two.has_photo, Some(false));
        assert_eq!(negative.has_photo, Some(false));
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(UserId(5).to_string(), "id5");
        assert_eq!(GroupId(5).to_string(), "club5");
        let agent = AgentId::for_groups(
            &GroupRef::Id(GroupId(1)),
            &GroupRef::ScreenName("mine".to_string()),
        );
        assert_eq!(agent.to_string(), "inviter[club1->mine]");
    }
}
