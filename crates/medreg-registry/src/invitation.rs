//! Single-use invitations.
//!
//! Every submission arrives through an [`Invitation`] handed out by the
//! registry's [`InvitationIssuer`]. Redeeming an invitation consumes it and
//! opens a [`Seat`]; the seat is exited only when the submission succeeds, so
//! a failed submission leaves the caller's transaction open.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::InvitationConfig;
use crate::error::InvitationError;

/// Description attached to invitations for record submission.
pub const PUBLISH_DESCRIPTION: &str = "publish patient data";

/// A capability to make exactly one submission.
///
/// Deliberately not `Clone`: redeeming moves it. A serialized copy can still
/// be presented again, which the issuer rejects.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    id: Uuid,
    description: String,
    issued_at: DateTime<Utc>,
}

impl Invitation {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

/// Transaction handle for one redeemed invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    invitation_id: Uuid,
    exited: bool,
}

impl Seat {
    fn open(invitation_id: Uuid) -> Self {
        Self {
            invitation_id,
            exited: false,
        }
    }

    pub fn invitation_id(&self) -> Uuid {
        self.invitation_id
    }

    /// Close the transaction. Idempotent.
    pub fn exit(&mut self) {
        self.exited = true;
    }

    pub fn has_exited(&self) -> bool {
        self.exited
    }
}

#[derive(Default)]
struct IssuerState {
    /// Unredeemed invitations and their issue times. UUID v7 ids sort by
    /// issue time, so the first entry is the oldest.
    outstanding: BTreeMap<Uuid, DateTime<Utc>>,
    /// Most recently redeemed ids, oldest first.
    redeemed: BTreeSet<Uuid>,
}

impl IssuerState {
    fn expire(&mut self, now: DateTime<Utc>, ttl_secs: u64) {
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        while let Some((&id, &issued_at)) = self.outstanding.first_key_value() {
            if now.signed_duration_since(issued_at).num_seconds() < ttl {
                break;
            }
            self.outstanding.remove(&id);
            debug!(invitation = %id, "invitation expired");
        }
    }

    fn remember(&mut self, id: Uuid, max_remembered: usize) {
        self.redeemed.insert(id);
        while self.redeemed.len() > max_remembered {
            self.redeemed.pop_first();
        }
    }
}

/// Issues invitations and redeems each at most once.
///
/// The issuer keeps at most `max_outstanding` unredeemed invitations and
/// `max_remembered` redeemed ids. Invitations expire after `ttl_secs`.
pub struct InvitationIssuer {
    limits: InvitationConfig,
    state: Mutex<IssuerState>,
}

impl InvitationIssuer {
    pub fn new() -> Self {
        Self::with_config(InvitationConfig::default())
    }

    pub fn with_config(limits: InvitationConfig) -> Self {
        Self {
            limits,
            state: Mutex::new(IssuerState::default()),
        }
    }

    pub fn limits(&self) -> &InvitationConfig {
        &self.limits
    }

    /// Issue a fresh invitation.
    pub fn issue(&self, description: impl Into<String>) -> Invitation {
        self.issue_at(description, Utc::now())
    }

    fn issue_at(&self, description: impl Into<String>, now: DateTime<Utc>) -> Invitation {
        let invitation = Invitation {
            id: Uuid::now_v7(),
            description: description.into(),
            issued_at: now,
        };
        let mut state = self.lock();
        state.expire(now, self.limits.ttl_secs);
        while state.outstanding.len() >= self.limits.max_outstanding {
            let Some((evicted, _)) = state.outstanding.pop_first() else {
                break;
            };
            debug!(invitation = %evicted, "evicted oldest outstanding invitation");
        }
        state.outstanding.insert(invitation.id, now);
        debug!(invitation = %invitation.id, "issued invitation");
        invitation
    }

    /// Consume an invitation and open its seat.
    ///
    /// Expired and evicted invitations are [`InvitationError::Unknown`].
    pub fn redeem(&self, invitation: Invitation) -> Result<Seat, InvitationError> {
        self.redeem_at(invitation, Utc::now())
    }

    fn redeem_at(&self, invitation: Invitation, now: DateTime<Utc>) -> Result<Seat, InvitationError> {
        let mut state = self.lock();
        state.expire(now, self.limits.ttl_secs);
        if state.outstanding.remove(&invitation.id).is_some() {
            state.remember(invitation.id, self.limits.max_remembered);
            Ok(Seat::open(invitation.id))
        } else if state.redeemed.contains(&invitation.id) {
            Err(InvitationError::AlreadyRedeemed(invitation.id))
        } else {
            Err(InvitationError::Unknown(invitation.id))
        }
    }

    /// Number of issued invitations not yet redeemed.
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding.len()
    }

    /// Number of redeemed ids kept for replay detection.
    pub fn remembered(&self) -> usize {
        self.lock().redeemed.len()
    }

    fn lock(&self) -> MutexGuard<'_, IssuerState> {
        // The maps stay consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for InvitationIssuer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InvitationIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("InvitationIssuer")
            .field("limits", &self.limits)
            .field("outstanding", &state.outstanding.len())
            .field("redeemed", &state.redeemed.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy_of(invitation: &Invitation) -> Invitation {
        serde_json::from_value(serde_json::to_value(invitation).unwrap()).unwrap()
    }

    #[test]
    fn issue_then_redeem_opens_a_seat() {
        let issuer = InvitationIssuer::new();
        let invitation = issuer.issue(PUBLISH_DESCRIPTION);
        let id = invitation.id();
        assert_eq!(invitation.description(), "publish patient data");
        assert_eq!(issuer.outstanding(), 1);

        let seat = issuer.redeem(invitation).unwrap();
        assert_eq!(seat.invitation_id(), id);
        assert!(!seat.has_exited());
        assert_eq!(issuer.outstanding(), 0);
    }

    #[test]
    fn second_redeem_is_rejected() {
        let issuer = InvitationIssuer::new();
        let invitation = issuer.issue(PUBLISH_DESCRIPTION);
        let replay = copy_of(&invitation);
        let id = invitation.id();

        issuer.redeem(invitation).unwrap();
        assert_eq!(
            issuer.redeem(replay).unwrap_err(),
            InvitationError::AlreadyRedeemed(id)
        );
    }

    #[test]
    fn foreign_invitations_are_unknown() {
        let ours = InvitationIssuer::new();
        let theirs = InvitationIssuer::new();
        let invitation = theirs.issue(PUBLISH_DESCRIPTION);
        let id = invitation.id();
        assert_eq!(
            ours.redeem(invitation).unwrap_err(),
            InvitationError::Unknown(id)
        );
    }

    #[test]
    fn invitation_ids_are_unique() {
        let issuer = InvitationIssuer::new();
        let a = issuer.issue("a");
        let b = issuer.issue("b");
        assert_ne!(a.id(), b.id());
        assert_eq!(issuer.outstanding(), 2);
    }

    #[test]
    fn seat_exit_is_idempotent() {
        let issuer = InvitationIssuer::new();
        let mut seat = issuer.redeem(issuer.issue("x")).unwrap();
        seat.exit();
        seat.exit();
        assert!(seat.has_exited());
    }

    #[test]
    fn invitation_serializes_camel_case() {
        let issuer = InvitationIssuer::new();
        let json = serde_json::to_value(issuer.issue("x")).unwrap();
        assert!(json.get("issuedAt").is_some());
        assert!(json.get("id").is_some());
    }

    // -----------------------------------------------------------------------
    // Bounds
    // -----------------------------------------------------------------------

    fn bounded(max_outstanding: usize, max_remembered: usize) -> InvitationIssuer {
        InvitationIssuer::with_config(InvitationConfig {
            max_outstanding,
            max_remembered,
            ttl_secs: 60,
        })
    }

    #[test]
    fn outstanding_invitations_are_capped() {
        let issuer = bounded(3, 3);
        let mut issued: Vec<Invitation> = (0..5).map(|_| issuer.issue("x")).collect();
        assert_eq!(issuer.outstanding(), 3);

        let newest = issued.pop().unwrap();
        let oldest = issued.remove(0);
        let oldest_id = oldest.id();
        assert_eq!(
            issuer.redeem(oldest).unwrap_err(),
            InvitationError::Unknown(oldest_id)
        );
        assert!(issuer.redeem(newest).is_ok());
    }

    #[test]
    fn unredeemed_invitations_never_pile_up() {
        let issuer = bounded(16, 16);
        for _ in 0..1_000 {
            issuer.issue(PUBLISH_DESCRIPTION);
        }
        assert_eq!(issuer.outstanding(), 16);
    }

    #[test]
    fn remembered_redemptions_are_capped() {
        let issuer = bounded(8, 2);
        let mut replays = Vec::new();
        for _ in 0..50 {
            let invitation = issuer.issue("x");
            replays.push(copy_of(&invitation));
            issuer.redeem(invitation).unwrap();
        }
        assert_eq!(issuer.remembered(), 2);
        assert_eq!(issuer.outstanding(), 0);

        let latest = replays.pop().unwrap();
        let latest_id = latest.id();
        assert_eq!(
            issuer.redeem(latest).unwrap_err(),
            InvitationError::AlreadyRedeemed(latest_id)
        );
        let first = replays.remove(0);
        let first_id = first.id();
        assert_eq!(
            issuer.redeem(first).unwrap_err(),
            InvitationError::Unknown(first_id)
        );
    }

    #[test]
    fn invitations_expire_after_ttl() {
        let issuer = bounded(8, 8);
        let t0 = Utc::now();
        let stale = issuer.issue_at("x", t0);
        let stale_id = stale.id();
        let fresh = issuer.issue_at("x", t0 + chrono::Duration::seconds(30));

        let later = t0 + chrono::Duration::seconds(61);
        assert_eq!(
            issuer.redeem_at(stale, later).unwrap_err(),
            InvitationError::Unknown(stale_id)
        );
        assert_eq!(issuer.outstanding(), 1);
        assert!(issuer.redeem_at(fresh, later).is_ok());
    }

    #[test]
    fn expired_invitations_are_dropped_on_issue() {
        let issuer = bounded(8, 8);
        let t0 = Utc::now();
        for _ in 0..5 {
            issuer.issue_at("x", t0);
        }
        issuer.issue_at("x", t0 + chrono::Duration::seconds(120));
        assert_eq!(issuer.outstanding(), 1);
    }
}
