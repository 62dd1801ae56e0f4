//! Vote entity.

use crate::{time, UserId, VoteTarget, VoteValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user's vote on one target.
///
/// At most one row exists per `(user, target)` pair; changing a vote
/// overwrites the value in place. A neutral value keeps the row so the
/// history of "voted, then took it back" is distinguishable from
/// "never voted".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    /// The voting user.
    pub user_id: UserId,

    /// What the vote applies to.
    pub target: VoteTarget,

    /// The current value of the vote.
    pub value: VoteValue,

    /// When the vote row was first created.
    pub created_at: DateTime<Utc>,

    /// When the value last changed.
    pub updated_at: DateTime<Utc>,
}

impl Vote {
    /// Creates a new vote.
    #[must_use]
    pub fn new(user_id: UserId, target: VoteTarget, value: VoteValue) -> Self {
        let now = time::now();
        Self {
            user_id,
            target,
            value,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the value, touching the update timestamp.
    pub fn set_value(&mut self, value: VoteValue) {
        self.value = value;
        self.updated_at = time::now();
    }

    /// Returns true when this vote counts toward neither tally.
    #[must_use]
    pub const fn is_neutral(&self) -> bool {
        self.value.is_neutral()
    }
}
