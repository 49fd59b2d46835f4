//! Members of a room and the franchises they have claimed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use gavel_protocol::{FranchiseCode, Lakhs, Member, MemberRole, Team, UserId};

/// Join-ordered members plus the franchise registry.
///
/// Non-spectators get selection ranks `1..=N` in join order; since members
/// are never removed the ranks stay contiguous.
#[derive(Debug, Clone, Default)]
pub struct Membership {
    members: Vec<Member>,
    teams: BTreeMap<FranchiseCode, Team>,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a member, ranking them after every existing participant.
    pub fn add(
        &mut self,
        user_id: UserId,
        display_name: String,
        role: MemberRole,
        now: DateTime<Utc>,
    ) -> Member {
        let selection_order = role
            .participates()
            .then(|| self.participant_count() as u32 + 1);
        let member = Member {
            user_id,
            display_name,
            role,
            selection_order,
            joined_at: now,
        };
        self.members.push(member.clone());
        member
    }

    pub fn member(&self, user_id: &UserId) -> Option<&Member> {
        self.members.iter().find(|m| &m.user_id == user_id)
    }

    /// Members in join order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Members that take part in franchise selection.
    pub fn participant_count(&self) -> usize {
        self.members.iter().filter(|m| m.role.participates()).count()
    }

    /// The earliest-ranked participant who has not claimed a franchise yet.
    pub fn next_to_pick(&self) -> Option<&Member> {
        self.members
            .iter()
            .filter(|m| m.selection_order.is_some() && self.franchise_of(&m.user_id).is_none())
            .min_by_key(|m| m.selection_order)
    }

    pub fn franchise_of(&self, user_id: &UserId) -> Option<FranchiseCode> {
        self.teams
            .values()
            .find(|t| &t.owner == user_id)
            .map(|t| t.franchise)
    }

    pub fn is_claimed(&self, franchise: FranchiseCode) -> bool {
        self.teams.contains_key(&franchise)
    }

    /// Allocates a fresh team for `member`. Callers check turn order and
    /// availability first.
    pub fn claim(&mut self, member: &Member, franchise: FranchiseCode, purse: Lakhs) -> Team {
        let team = Team {
            franchise,
            owner: member.user_id.clone(),
            owner_name: member.display_name.clone(),
            selection_order: member.selection_order.unwrap_or_default(),
            purse_left: purse,
            total_count: 0,
            overseas_count: 0,
            has_ended: false,
        };
        self.teams.insert(franchise, team.clone());
        team
    }

    pub fn team(&self, franchise: FranchiseCode) -> Option<&Team> {
        self.teams.get(&franchise)
    }

    pub fn team_mut(&mut self, franchise: FranchiseCode) -> Option<&mut Team> {
        self.teams.get_mut(&franchise)
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    /// Teams in the order their owners picked.
    pub fn teams(&self) -> Vec<&Team> {
        let mut teams: Vec<&Team> = self.teams.values().collect();
        teams.sort_by_key(|t| t.selection_order);
        teams
    }

    /// `true` once there is at least one team and every team has ended.
    pub fn all_ended(&self) -> bool {
        !self.teams.is_empty() && self.teams.values().all(|t| t.has_ended)
    }
}
