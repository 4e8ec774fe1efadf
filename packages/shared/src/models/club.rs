use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field names used by club records and player club indexes.
pub mod fields {
    // club_<id>, public partition
    pub const ENTITY_TYPE: &str = "entityType";
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const COUNTRY: &str = "country";
    pub const APPROVAL_REQUIRED: &str = "approvalRequired";
    pub const MEMBERS: &str = "members";
    pub const MEMBER_COUNT: &str = "memberCount";

    // club_<id>, private partition
    pub const ADMIN: &str = "admin";
    pub const PENDING_APPROVALS: &str = "pendingApprovals";

    // <player id>, protected partition
    pub const MEMBER_CLUBS: &str = "memberClubs";
    pub const ADMIN_CLUBS: &str = "adminClubs";

    pub const SUMMARY: &[&str] = &[ID, NAME, COUNTRY, APPROVAL_REQUIRED, MEMBER_COUNT];
}

pub const CLUB_ENTITY_TYPE: &str = "club";

pub fn club_record_id(id: &str) -> String {
    format!("club_{}", id)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubSummary {
    pub id: String,
    pub name: String,
    pub country: String,
    pub approval_required: bool,
    pub member_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MyStatus {
    Member,
    Pending,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinStatus {
    Joined,
    Pending,
}

/// Everything a client needs to render a club page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubView {
    #[serde(flatten)]
    pub club: ClubSummary,
    /// Member id to display name
    pub members: BTreeMap<String, String>,
    pub admin_id: String,
    pub is_admin: bool,
    pub my_status: MyStatus,
}

/// Admin view returned after every membership decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberManagementView {
    pub pending: BTreeMap<String, String>,
    pub members: BTreeMap<String, String>,
    pub member_count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberCountSort {
    Ascending,
    Descending,
    #[default]
    Unsorted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    pub name_prefix: Option<String>,
    pub country_prefix: Option<String>,
    #[serde(default)]
    pub sort: MemberCountSort,
}

impl MemberCountSort {
    pub fn apply(&self, clubs: &mut [ClubSummary]) {
        match self {
            MemberCountSort::Ascending => clubs.sort_by_key(|c| c.member_count),
            MemberCountSort::Descending => {
                clubs.sort_by(|a, b| b.member_count.cmp(&a.member_count))
            }
            MemberCountSort::Unsorted => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, member_count: u32) -> ClubSummary {
        ClubSummary {
            id: id.to_string(),
            name: id.to_string(),
            country: "IE".to_string(),
            approval_required: false,
            member_count,
        }
    }

    #[test]
    fn test_sort_orders() {
        let mut clubs = vec![summary("a", 3), summary("b", 1), summary("c", 2)];

        MemberCountSort::Ascending.apply(&mut clubs);
        let ids: Vec<_> = clubs.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        MemberCountSort::Descending.apply(&mut clubs);
        let ids: Vec<_> = clubs.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_search_filters_default_sort() {
        let filters: SearchFilters = serde_json::from_str(r#"{"namePrefix":"Kn"}"#).unwrap();

        assert_eq!(filters.name_prefix.as_deref(), Some("Kn"));
        assert_eq!(filters.sort, MemberCountSort::Unsorted);
    }

    #[test]
    fn test_club_view_flattens_summary() {
        let view = ClubView {
            club: summary("club_1", 1),
            members: BTreeMap::from([("alice".to_string(), "Alice".to_string())]),
            admin_id: "alice".to_string(),
            is_admin: true,
            my_status: MyStatus::Member,
        };

        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["memberCount"], 1);
        assert_eq!(json["myStatus"], "member");
        assert_eq!(json["members"]["alice"], "Alice");
    }
}
