use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::RetryPolicy;
use crate::models::club::{
    club_record_id, fields, ClubSummary, ClubView, JoinStatus, MemberManagementView, MyStatus,
    SearchFilters, CLUB_ENTITY_TYPE,
};
use crate::models::record::{FieldFilter, FieldSet, FieldWrite, Partition, Precondition, QueryRow};
use crate::repositories::player_name_repository::PlayerNameRepository;
use crate::repositories::record_store::RecordStore;
use crate::services::concurrency::{retry_on_conflict, with_deadline};
use crate::services::errors::service_errors::ServiceError;

const MAX_NAME_LENGTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexChange {
    /// Creator: member and admin of the club
    Create,
    Join,
    Leave,
}

/// Outcome of a membership mutation. `InPlace` means an earlier call already
/// committed it; the player's index may still lag and is reconciled before
/// the carried error is returned.
#[derive(Debug)]
enum Membership<T> {
    Changed(T),
    InPlace(&'static str),
}

/// Club membership under optimistic concurrency.
///
/// Every mutation reads the fields it changes together with their version
/// tokens and writes them back in one batch guarded by those tokens. A
/// conflicting writer forces a fresh read and a second pass.
#[derive(Clone)]
pub struct ClubService {
    records: Arc<dyn RecordStore + Send + Sync>,
    names: Arc<dyn PlayerNameRepository + Send + Sync>,
    retry: RetryPolicy,
    deadline: Duration,
    blocked_terms: Vec<String>,
}

impl ClubService {
    pub fn new(
        records: Arc<dyn RecordStore + Send + Sync>,
        names: Arc<dyn PlayerNameRepository + Send + Sync>,
        retry: RetryPolicy,
        deadline: Duration,
        blocked_terms: Vec<String>,
    ) -> Self {
        Self {
            records,
            names,
            retry,
            deadline,
            blocked_terms: blocked_terms.into_iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    fn is_profanity_safe(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        !self.blocked_terms.iter().any(|term| lowered.contains(term))
    }

    pub async fn create_club(
        &self,
        creator_id: &str,
        name: &str,
        country: &str,
        approval_required: bool,
    ) -> Result<String, ServiceError> {
        with_deadline(self.deadline, "create_club", async {
            let name = name.trim();
            let country = country.trim();
            if name.is_empty() || country.is_empty() {
                return Err(ServiceError::Validation(
                    "Club name and country are required".to_string(),
                ));
            }
            if name.chars().count() > MAX_NAME_LENGTH {
                return Err(ServiceError::Validation(format!(
                    "Club name cannot be longer than {} characters",
                    MAX_NAME_LENGTH
                )));
            }
            if !self.is_profanity_safe(name) {
                return Err(ServiceError::Validation(
                    "Club name cannot contain profanity".to_string(),
                ));
            }

            // Check-then-write: two concurrent creators can both pass this
            let existing = self
                .records
                .query(
                    Partition::Public,
                    &[
                        FieldFilter::eq(fields::ENTITY_TYPE, CLUB_ENTITY_TYPE),
                        FieldFilter::eq(fields::COUNTRY, country),
                        FieldFilter::eq(fields::NAME, name),
                    ],
                    &[fields::ID],
                )
                .await?;
            if !existing.is_empty() {
                for row in &existing {
                    let existing_id: String = row.get(fields::ID)?;
                    let private = self
                        .records
                        .get_fields(
                            &club_record_id(&existing_id),
                            Partition::Private,
                            &[fields::ADMIN],
                        )
                        .await?;
                    let (admin_id, _) = private.value_or_default::<String>(fields::ADMIN)?;
                    if admin_id == creator_id {
                        self.update_index(creator_id, &existing_id, IndexChange::Create)
                            .await?;
                    }
                }
                return Err(ServiceError::InvalidState(
                    "Club with the same name already exists in the same country".to_string(),
                ));
            }

            let club_id = Uuid::new_v4().to_string();
            let members = vec![creator_id.to_string()];
            let public = |field: &str, value: serde_json::Value| FieldWrite {
                partition: Partition::Public,
                field: field.to_string(),
                value,
                precondition: Precondition::Absent,
            };
            self.records
                .set_fields(
                    &club_record_id(&club_id),
                    vec![
                        public(fields::ENTITY_TYPE, CLUB_ENTITY_TYPE.into()),
                        public(fields::ID, club_id.clone().into()),
                        public(fields::NAME, name.into()),
                        public(fields::COUNTRY, country.into()),
                        public(fields::APPROVAL_REQUIRED, approval_required.into()),
                        FieldWrite::new(
                            Partition::Public,
                            fields::MEMBERS,
                            &members,
                            Precondition::Absent,
                        )?,
                        public(fields::MEMBER_COUNT, 1.into()),
                        FieldWrite::new(
                            Partition::Private,
                            fields::ADMIN,
                            &creator_id,
                            Precondition::Absent,
                        )?,
                    ],
                )
                .await?;
            info!("Player {} created club {} ({})", creator_id, club_id, name);

            self.update_index(creator_id, &club_id, IndexChange::Create)
                .await?;
            Ok(club_id)
        })
        .await
    }

    pub async fn join_club(&self, player_id: &str, club_id: &str) -> Result<JoinStatus, ServiceError> {
        with_deadline(self.deadline, "join_club", async {
            let status = match retry_on_conflict(&self.retry, "join_club", || {
                self.try_join_club(player_id, club_id)
            })
            .await?
            {
                Membership::Changed(status) => status,
                Membership::InPlace(message) => {
                    self.update_index(player_id, club_id, IndexChange::Join)
                        .await?;
                    return Err(ServiceError::InvalidState(message.to_string()));
                }
            };

            if status == JoinStatus::Joined {
                self.update_index(player_id, club_id, IndexChange::Join)
                    .await?;
            }
            info!("Player {} join request on club {}: {:?}", player_id, club_id, status);
            Ok(status)
        })
        .await
    }

    async fn try_join_club(
        &self,
        player_id: &str,
        club_id: &str,
    ) -> Result<Membership<JoinStatus>, ServiceError> {
        let record_id = club_record_id(club_id);
        let public = self
            .records
            .get_fields(
                &record_id,
                Partition::Public,
                &[fields::MEMBERS, fields::MEMBER_COUNT, fields::APPROVAL_REQUIRED],
            )
            .await?;
        if !public.contains(fields::MEMBERS) {
            return Err(ServiceError::NotFound("Club".to_string()));
        }
        let (mut members, members_guard) = public.value_or_default::<Vec<String>>(fields::MEMBERS)?;
        let (member_count, count_guard) = public.value_or_default::<u32>(fields::MEMBER_COUNT)?;
        let (approval_required, _) = public.value_or_default::<bool>(fields::APPROVAL_REQUIRED)?;

        if members.iter().any(|m| m == player_id) {
            return Ok(Membership::InPlace("Player is already a member of the club"));
        }

        if approval_required {
            let private = self
                .records
                .get_fields(&record_id, Partition::Private, &[fields::PENDING_APPROVALS])
                .await?;
            let (mut pending, pending_guard) =
                private.value_or_default::<Vec<String>>(fields::PENDING_APPROVALS)?;
            if pending.iter().any(|p| p == player_id) {
                return Err(ServiceError::InvalidState(
                    "Player already has an approval pending".to_string(),
                ));
            }
            pending.push(player_id.to_string());
            // Members rewritten unchanged so an admit since the public read conflicts
            self.records
                .set_fields(
                    &record_id,
                    vec![
                        FieldWrite::new(Partition::Public, fields::MEMBERS, &members, members_guard)?,
                        FieldWrite::new(
                            Partition::Private,
                            fields::PENDING_APPROVALS,
                            &pending,
                            pending_guard,
                        )?,
                    ],
                )
                .await?;
            return Ok(Membership::Changed(JoinStatus::Pending));
        }

        members.push(player_id.to_string());
        self.records
            .set_fields(
                &record_id,
                vec![
                    FieldWrite::new(Partition::Public, fields::MEMBERS, &members, members_guard)?,
                    FieldWrite::new(
                        Partition::Public,
                        fields::MEMBER_COUNT,
                        &(member_count + 1),
                        count_guard,
                    )?,
                ],
            )
            .await?;
        Ok(Membership::Changed(JoinStatus::Joined))
    }

    /// Clubs the player belongs to. Index entries whose club no longer exists
    /// are skipped.
    pub async fn list_my_clubs(&self, player_id: &str) -> Result<Vec<ClubSummary>, ServiceError> {
        with_deadline(self.deadline, "list_my_clubs", async {
            let index = self
                .records
                .get_fields(player_id, Partition::Protected, &[fields::MEMBER_CLUBS])
                .await?;
            let (club_ids, _) = index.value_or_default::<Vec<String>>(fields::MEMBER_CLUBS)?;

            let mut clubs = Vec::with_capacity(club_ids.len());
            for club_id in club_ids {
                let read = self
                    .records
                    .get_fields(&club_record_id(&club_id), Partition::Public, fields::SUMMARY)
                    .await?;
                if !read.contains(fields::ID) {
                    warn!(
                        "Player {} index references missing club {}",
                        player_id, club_id
                    );
                    continue;
                }
                clubs.push(Self::summary_from_fields(&read)?);
            }
            Ok(clubs)
        })
        .await
    }

    pub async fn search_clubs(&self, filters: &SearchFilters) -> Result<Vec<ClubSummary>, ServiceError> {
        with_deadline(self.deadline, "search_clubs", async {
            let mut query = vec![FieldFilter::eq(fields::ENTITY_TYPE, CLUB_ENTITY_TYPE)];
            if let Some(prefix) = filters.name_prefix.as_deref().filter(|p| !p.is_empty()) {
                query.push(FieldFilter::begins_with(fields::NAME, prefix));
            }
            if let Some(prefix) = filters.country_prefix.as_deref().filter(|p| !p.is_empty()) {
                query.push(FieldFilter::begins_with(fields::COUNTRY, prefix));
            }

            let rows = self
                .records
                .query(Partition::Public, &query, fields::SUMMARY)
                .await?;
            let mut clubs = rows
                .iter()
                .map(Self::summary_from_row)
                .collect::<Result<Vec<_>, _>>()?;
            filters.sort.apply(&mut clubs);
            Ok(clubs)
        })
        .await
    }

    /// Full club state from the caller's point of view.
    pub async fn load_club(&self, player_id: &str, club_id: &str) -> Result<ClubView, ServiceError> {
        with_deadline(self.deadline, "load_club", async {
            let record_id = club_record_id(club_id);
            let mut requested = fields::SUMMARY.to_vec();
            requested.push(fields::MEMBERS);
            let public = self
                .records
                .get_fields(&record_id, Partition::Public, &requested)
                .await?;
            if !public.contains(fields::ID) {
                return Err(ServiceError::NotFound("Club".to_string()));
            }
            let club = Self::summary_from_fields(&public)?;
            let (members, _) = public.value_or_default::<Vec<String>>(fields::MEMBERS)?;

            let private = self
                .records
                .get_fields(
                    &record_id,
                    Partition::Private,
                    &[fields::ADMIN, fields::PENDING_APPROVALS],
                )
                .await?;
            let (admin_id, _) = private.value_or_default::<String>(fields::ADMIN)?;
            let (pending, _) = private.value_or_default::<Vec<String>>(fields::PENDING_APPROVALS)?;

            let my_status = if members.iter().any(|m| m == player_id) {
                MyStatus::Member
            } else if club.approval_required && pending.iter().any(|p| p == player_id) {
                MyStatus::Pending
            } else {
                MyStatus::None
            };

            Ok(ClubView {
                members: self.display_names(&members).await,
                is_admin: admin_id == player_id,
                admin_id,
                my_status,
                club,
            })
        })
        .await
    }

    /// Pending join requests with display names. Admin only.
    pub async fn load_club_join_requests(
        &self,
        admin_id: &str,
        club_id: &str,
    ) -> Result<BTreeMap<String, String>, ServiceError> {
        with_deadline(self.deadline, "load_club_join_requests", async {
            let private = self
                .read_private_as_admin(
                    admin_id,
                    club_id,
                    "Only the club admin can view join requests",
                )
                .await?;
            let (pending, _) = private.value_or_default::<Vec<String>>(fields::PENDING_APPROVALS)?;
            Ok(self.display_names(&pending).await)
        })
        .await
    }

    pub async fn admit_club_member(
        &self,
        admin_id: &str,
        club_id: &str,
        member_id: &str,
    ) -> Result<MemberManagementView, ServiceError> {
        with_deadline(self.deadline, "admit_club_member", async {
            let (pending, members) = match retry_on_conflict(&self.retry, "admit_club_member", || {
                self.try_admit(admin_id, club_id, member_id)
            })
            .await?
            {
                Membership::Changed(lists) => lists,
                Membership::InPlace(message) => {
                    self.update_index(member_id, club_id, IndexChange::Join)
                        .await?;
                    return Err(ServiceError::InvalidState(message.to_string()));
                }
            };
            info!("Player {} admitted to club {}", member_id, club_id);

            self.update_index(member_id, club_id, IndexChange::Join)
                .await?;
            Ok(self.management_view(&pending, &members).await)
        })
        .await
    }

    async fn try_admit(
        &self,
        admin_id: &str,
        club_id: &str,
        member_id: &str,
    ) -> Result<Membership<(Vec<String>, Vec<String>)>, ServiceError> {
        let record_id = club_record_id(club_id);
        let private = self
            .read_private_as_admin(
                admin_id,
                club_id,
                "Only the club admin can approve join requests",
            )
            .await?;
        let (mut pending, pending_guard) =
            private.value_or_default::<Vec<String>>(fields::PENDING_APPROVALS)?;

        let public = self
            .records
            .get_fields(
                &record_id,
                Partition::Public,
                &[fields::MEMBERS, fields::MEMBER_COUNT],
            )
            .await?;
        let (mut members, members_guard) = public.value_or_default::<Vec<String>>(fields::MEMBERS)?;
        let (member_count, count_guard) = public.value_or_default::<u32>(fields::MEMBER_COUNT)?;
        if members.iter().any(|m| m == member_id) {
            return Ok(Membership::InPlace(
                "Provided player is already a member of the club",
            ));
        }
        if !pending.iter().any(|p| p == member_id) {
            return Err(ServiceError::InvalidState(
                "Provided player has not requested to join the club".to_string(),
            ));
        }

        pending.retain(|p| p != member_id);
        members.push(member_id.to_string());
        self.records
            .set_fields(
                &record_id,
                vec![
                    FieldWrite::new(Partition::Public, fields::MEMBERS, &members, members_guard)?,
                    FieldWrite::new(
                        Partition::Public,
                        fields::MEMBER_COUNT,
                        &(member_count + 1),
                        count_guard,
                    )?,
                    FieldWrite::new(
                        Partition::Private,
                        fields::PENDING_APPROVALS,
                        &pending,
                        pending_guard,
                    )?,
                ],
            )
            .await?;
        Ok(Membership::Changed((pending, members)))
    }

    pub async fn deny_club_member(
        &self,
        admin_id: &str,
        club_id: &str,
        member_id: &str,
    ) -> Result<MemberManagementView, ServiceError> {
        with_deadline(self.deadline, "deny_club_member", async {
            let pending = retry_on_conflict(&self.retry, "deny_club_member", || {
                self.try_deny(admin_id, club_id, member_id)
            })
            .await?;
            info!("Player {} denied from club {}", member_id, club_id);

            let public = self
                .records
                .get_fields(&club_record_id(club_id), Partition::Public, &[fields::MEMBERS])
                .await?;
            let (members, _) = public.value_or_default::<Vec<String>>(fields::MEMBERS)?;
            Ok(self.management_view(&pending, &members).await)
        })
        .await
    }

    async fn try_deny(
        &self,
        admin_id: &str,
        club_id: &str,
        member_id: &str,
    ) -> Result<Vec<String>, ServiceError> {
        let private = self
            .read_private_as_admin(
                admin_id,
                club_id,
                "Only the club admin can approve join requests",
            )
            .await?;
        let (mut pending, pending_guard) =
            private.value_or_default::<Vec<String>>(fields::PENDING_APPROVALS)?;
        if !pending.iter().any(|p| p == member_id) {
            return Err(ServiceError::InvalidState(
                "Provided player has not requested to join the club".to_string(),
            ));
        }

        pending.retain(|p| p != member_id);
        self.records
            .set_fields(
                &club_record_id(club_id),
                vec![FieldWrite::new(
                    Partition::Private,
                    fields::PENDING_APPROVALS,
                    &pending,
                    pending_guard,
                )?],
            )
            .await?;
        Ok(pending)
    }

    pub async fn kick_club_member(
        &self,
        admin_id: &str,
        club_id: &str,
        member_id: &str,
    ) -> Result<MemberManagementView, ServiceError> {
        with_deadline(self.deadline, "kick_club_member", async {
            let (pending, members) = match retry_on_conflict(&self.retry, "kick_club_member", || {
                self.try_kick(admin_id, club_id, member_id)
            })
            .await?
            {
                Membership::Changed(lists) => lists,
                Membership::InPlace(message) => {
                    self.update_index(member_id, club_id, IndexChange::Leave)
                        .await?;
                    return Err(ServiceError::InvalidState(message.to_string()));
                }
            };
            info!("Player {} removed from club {}", member_id, club_id);

            self.update_index(member_id, club_id, IndexChange::Leave)
                .await?;
            Ok(self.management_view(&pending, &members).await)
        })
        .await
    }

    async fn try_kick(
        &self,
        admin_id: &str,
        club_id: &str,
        member_id: &str,
    ) -> Result<Membership<(Vec<String>, Vec<String>)>, ServiceError> {
        let record_id = club_record_id(club_id);
        let private = self
            .read_private_as_admin(admin_id, club_id, "Only the club admin can kick members")
            .await?;
        if member_id == admin_id {
            return Err(ServiceError::InvalidState(
                "The club admin cannot be removed from the club".to_string(),
            ));
        }
        let (pending, _) = private.value_or_default::<Vec<String>>(fields::PENDING_APPROVALS)?;

        let public = self
            .records
            .get_fields(
                &record_id,
                Partition::Public,
                &[fields::MEMBERS, fields::MEMBER_COUNT],
            )
            .await?;
        let (mut members, members_guard) = public.value_or_default::<Vec<String>>(fields::MEMBERS)?;
        let (member_count, count_guard) = public.value_or_default::<u32>(fields::MEMBER_COUNT)?;
        if !members.iter().any(|m| m == member_id) {
            return Ok(Membership::InPlace("Provided player is not a club member"));
        }

        members.retain(|m| m != member_id);
        self.records
            .set_fields(
                &record_id,
                vec![
                    FieldWrite::new(Partition::Public, fields::MEMBERS, &members, members_guard)?,
                    FieldWrite::new(
                        Partition::Public,
                        fields::MEMBER_COUNT,
                        &member_count.saturating_sub(1),
                        count_guard,
                    )?,
                ],
            )
            .await?;
        Ok(Membership::Changed((pending, members)))
    }

    /// Removes the club from every member's index, one member at a time, then
    /// deletes the club. When any index update fails the club is kept and the
    /// error names the members still to clean up; calling again finishes the
    /// job.
    pub async fn delete_club(&self, admin_id: &str, club_id: &str) -> Result<(), ServiceError> {
        with_deadline(self.deadline, "delete_club", async {
            let record_id = club_record_id(club_id);
            self.read_private_as_admin(admin_id, club_id, "Only the club admin can delete the club")
                .await?;

            let public = self
                .records
                .get_fields(&record_id, Partition::Public, &[fields::MEMBERS])
                .await?;
            let (members, _) = public.value_or_default::<Vec<String>>(fields::MEMBERS)?;

            let mut failed = Vec::new();
            for member_id in &members {
                if let Err(e) = self
                    .update_index(member_id, club_id, IndexChange::Leave)
                    .await
                {
                    warn!(
                        "Could not remove club {} from index of {}: {}",
                        club_id, member_id, e
                    );
                    failed.push(member_id.clone());
                }
            }
            if !failed.is_empty() {
                return Err(ServiceError::PartialFailure {
                    operation: "delete_club".to_string(),
                    failed,
                });
            }

            self.records
                .delete_record(&record_id, Partition::Public)
                .await?;
            self.records
                .delete_record(&record_id, Partition::Private)
                .await?;
            info!("Club {} deleted by {}", club_id, admin_id);
            Ok(())
        })
        .await
    }

    async fn read_private_as_admin(
        &self,
        admin_id: &str,
        club_id: &str,
        denied: &str,
    ) -> Result<FieldSet, ServiceError> {
        let private = self
            .records
            .get_fields(
                &club_record_id(club_id),
                Partition::Private,
                &[fields::ADMIN, fields::PENDING_APPROVALS],
            )
            .await?;
        match private.get::<String>(fields::ADMIN)? {
            None => Err(ServiceError::NotFound("Club".to_string())),
            Some(admin) if admin.value != admin_id => {
                Err(ServiceError::Unauthorized(denied.to_string()))
            }
            Some(_) => Ok(private),
        }
    }

    async fn update_index(
        &self,
        player_id: &str,
        club_id: &str,
        change: IndexChange,
    ) -> Result<(), ServiceError> {
        retry_on_conflict(&self.retry, "update_club_index", || {
            self.try_update_index(player_id, club_id, change)
        })
        .await
    }

    async fn try_update_index(
        &self,
        player_id: &str,
        club_id: &str,
        change: IndexChange,
    ) -> Result<(), ServiceError> {
        let index = self
            .records
            .get_fields(
                player_id,
                Partition::Protected,
                &[fields::MEMBER_CLUBS, fields::ADMIN_CLUBS],
            )
            .await?;
        let (mut member_clubs, member_guard) =
            index.value_or_default::<Vec<String>>(fields::MEMBER_CLUBS)?;
        let (mut admin_clubs, admin_guard) =
            index.value_or_default::<Vec<String>>(fields::ADMIN_CLUBS)?;

        let mut writes = Vec::new();
        let member_changed = match change {
            IndexChange::Create | IndexChange::Join => add_unique(&mut member_clubs, club_id),
            IndexChange::Leave => remove_all(&mut member_clubs, club_id),
        };
        if member_changed {
            writes.push(FieldWrite::new(
                Partition::Protected,
                fields::MEMBER_CLUBS,
                &member_clubs,
                member_guard,
            )?);
        }
        let admin_changed = match change {
            IndexChange::Create => add_unique(&mut admin_clubs, club_id),
            IndexChange::Leave => remove_all(&mut admin_clubs, club_id),
            IndexChange::Join => false,
        };
        if admin_changed {
            writes.push(FieldWrite::new(
                Partition::Protected,
                fields::ADMIN_CLUBS,
                &admin_clubs,
                admin_guard,
            )?);
        }

        if !writes.is_empty() {
            self.records.set_fields(player_id, writes).await?;
        }
        Ok(())
    }

    async fn management_view(&self, pending: &[String], members: &[String]) -> MemberManagementView {
        MemberManagementView {
            pending: self.display_names(pending).await,
            members: self.display_names(members).await,
            member_count: members.len() as u32,
        }
    }

    /// Names are cosmetic: a lookup failure degrades to ids.
    async fn display_names(&self, player_ids: &[String]) -> BTreeMap<String, String> {
        let names = match self.names.get_names(player_ids).await {
            Ok(names) => names,
            Err(e) => {
                warn!("Display name lookup failed: {}", e);
                Default::default()
            }
        };
        player_ids
            .iter()
            .map(|id| {
                let name = names.get(id).cloned().unwrap_or_else(|| id.clone());
                (id.clone(), name)
            })
            .collect()
    }

    fn summary_from_fields(read: &FieldSet) -> Result<ClubSummary, ServiceError> {
        Ok(ClubSummary {
            id: read.value_or_default::<String>(fields::ID)?.0,
            name: read.value_or_default::<String>(fields::NAME)?.0,
            country: read.value_or_default::<String>(fields::COUNTRY)?.0,
            approval_required: read.value_or_default::<bool>(fields::APPROVAL_REQUIRED)?.0,
            member_count: read.value_or_default::<u32>(fields::MEMBER_COUNT)?.0,
        })
    }

    fn summary_from_row(row: &QueryRow) -> Result<ClubSummary, ServiceError> {
        Ok(ClubSummary {
            id: row.get(fields::ID)?,
            name: row.get(fields::NAME)?,
            country: row.get(fields::COUNTRY)?,
            approval_required: row.get(fields::APPROVAL_REQUIRED)?,
            member_count: row.get(fields::MEMBER_COUNT)?,
        })
    }
}

fn add_unique(list: &mut Vec<String>, id: &str) -> bool {
    if list.iter().any(|entry| entry == id) {
        return false;
    }
    list.push(id.to_string());
    true
}

fn remove_all(list: &mut Vec<String>, id: &str) -> bool {
    let before = list.len();
    list.retain(|entry| entry != id);
    list.len() != before
}
