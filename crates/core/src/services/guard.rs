//! Authorization guard.
//!
//! Every resource-scoped request is checked here before it reaches a store.
//! Rules run in order:
//!
//! 1. the acting user must exist,
//! 2. the resource owner must not have banned the acting user,
//! 3. ownership-gated actions require the acting user to be the subject.
//!
//! Following adds one more rule: the follow target must not have banned the
//! acting user.

use photoshare_common::{AppError, AppResult};
use photoshare_db::repositories::{BanRepository, UserRepository};

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// The acting user does not exist.
    Unauthenticated,
    /// The resource owner has banned the acting user.
    BannedByOwner,
    /// The action is reserved to the subject user.
    NotSubject,
    /// The follow target has banned the acting user.
    BannedByTarget,
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => Self::Unauthorized("Unknown acting user".to_string()),
            Denial::BannedByOwner => {
                Self::Forbidden("You are banned by the resource owner".to_string())
            }
            Denial::NotSubject => {
                Self::Forbidden("You can only perform this action as yourself".to_string())
            }
            Denial::BannedByTarget => {
                Self::Forbidden("Cannot follow someone who banned you".to_string())
            }
        }
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The action may proceed.
    Allow,
    /// The action is refused.
    Deny(Denial),
}

impl Decision {
    /// Turn a denial into its error.
    pub fn into_result(self) -> AppResult<()> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(denial) => Err(denial.into()),
        }
    }

    /// Whether the action may proceed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// What is being acted upon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Target {
    /// Owner of the resource, checked against bans.
    pub owner: Option<i32>,
    /// User the action must be performed as.
    pub subject: Option<i32>,
}

impl Target {
    /// A resource owned by `owner`, open to anyone not banned by them.
    #[must_use]
    pub const fn owned_by(owner: i32) -> Self {
        Self {
            owner: Some(owner),
            subject: None,
        }
    }

    /// A resource owned by `owner` that only `owner` may act on.
    #[must_use]
    pub const fn own(owner: i32) -> Self {
        Self {
            owner: Some(owner),
            subject: Some(owner),
        }
    }

    /// A resource owned by `owner` that only `subject` may act on.
    #[must_use]
    pub const fn owned_by_as(owner: i32, subject: i32) -> Self {
        Self {
            owner: Some(owner),
            subject: Some(subject),
        }
    }
}

/// Authorization guard.
#[derive(Clone)]
pub struct GuardService {
    user_repo: UserRepository,
    ban_repo: BanRepository,
}

impl GuardService {
    /// Create a new guard.
    #[must_use]
    pub const fn new(user_repo: UserRepository, ban_repo: BanRepository) -> Self {
        Self {
            user_repo,
            ban_repo,
        }
    }

    /// Decide whether `actor_id` may act on `target`.
    pub async fn can_act(&self, actor_id: i32, target: Target) -> AppResult<Decision> {
        if !self.user_repo.exists(actor_id).await? {
            return Ok(Decision::Deny(Denial::Unauthenticated));
        }

        if let Some(owner_id) = target.owner
            && owner_id != actor_id
            && self.ban_repo.is_banned(owner_id, actor_id).await?
        {
            return Ok(Decision::Deny(Denial::BannedByOwner));
        }

        if let Some(subject_id) = target.subject
            && subject_id != actor_id
        {
            return Ok(Decision::Deny(Denial::NotSubject));
        }

        Ok(Decision::Allow)
    }

    /// Decide whether `actor_id`, acting as `subject_id`, may follow `followee_id`.
    pub async fn can_follow(
        &self,
        actor_id: i32,
        subject_id: i32,
        followee_id: i32,
    ) -> AppResult<Decision> {
        let decision = self.can_act(actor_id, Target::own(subject_id)).await?;
        if !decision.is_allowed() {
            return Ok(decision);
        }

        if followee_id != actor_id && self.ban_repo.is_banned(followee_id, actor_id).await? {
            return Ok(Decision::Deny(Denial::BannedByTarget));
        }

        Ok(Decision::Allow)
    }

    /// Like [`Self::can_act`], failing with the denial's error.
    pub async fn authorize(&self, actor_id: i32, target: Target) -> AppResult<()> {
        self.can_act(actor_id, target).await?.into_result()
    }

    /// Like [`Self::can_follow`], failing with the denial's error.
    pub async fn authorize_follow(
        &self,
        actor_id: i32,
        subject_id: i32,
        followee_id: i32,
    ) -> AppResult<()> {
        self.can_follow(actor_id, subject_id, followee_id)
            .await?
            .into_result()
    }
}
