//! Discussion state: rounds, entries and speaker rotation.
//!
//! Round records are append-only. Only the newest round can be mutated, and
//! only until it is closed.

use crate::core::error::DomainError;
use crate::core::participant::Participant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upper bound for the configurable round cap
pub const MAX_ROUNDS_CAP: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscussionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    /// Too few participants survived questioning to hold a discussion
    Skipped,
}

impl DiscussionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DiscussionStatus::Completed | DiscussionStatus::Failed | DiscussionStatus::Skipped
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Pending,
    Responding,
    Done,
    Failed,
}

/// One speaker's contribution to a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub participant: Participant,
    pub state: EntryState,
    pub output: String,
    pub error: Option<String>,
}

impl Entry {
    fn pending(participant: Participant) -> Self {
        Self {
            participant,
            state: EntryState::Pending,
            output: String::new(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    pub speakers: Vec<Participant>,
    pub entries: BTreeMap<Participant, Entry>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Round {
    fn new(number: u32, speakers: Vec<Participant>) -> Self {
        let entries = speakers.iter().map(|p| (*p, Entry::pending(*p))).collect();
        Self {
            number,
            speakers,
            entries,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.ended_at.is_some()
    }

    pub fn entry(&self, participant: Participant) -> Option<&Entry> {
        self.entries.get(&participant)
    }

    pub fn mark_responding(&mut self, participant: Participant) {
        if let Some(entry) = self.entries.get_mut(&participant) {
            entry.state = EntryState::Responding;
        }
    }

    pub fn mark_done(&mut self, participant: Participant, output: impl Into<String>) {
        if let Some(entry) = self.entries.get_mut(&participant) {
            entry.state = EntryState::Done;
            entry.output = output.into();
            entry.error = None;
        }
    }

    pub fn mark_failed(&mut self, participant: Participant, error: impl Into<String>) {
        if let Some(entry) = self.entries.get_mut(&participant) {
            entry.state = EntryState::Failed;
            entry.error = Some(error.into());
        }
    }

    pub fn succeeded(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.state == EntryState::Done)
            .count()
    }

    /// Every speaker failed. A round with no speakers has not "all failed".
    pub fn all_failed(&self) -> bool {
        !self.entries.is_empty()
            && self
                .entries
                .values()
                .all(|e| e.state == EntryState::Failed)
    }
}

/// In-memory discussion state, mirrored to JSON after each change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscussionState {
    pub current_round: u32,
    pub max_rounds: u32,
    pub status: DiscussionStatus,
    /// Participants that succeeded the initial question
    pub participants: Vec<Participant>,
    pub rounds: Vec<Round>,
}

impl DiscussionState {
    pub fn new(max_rounds: u32, participants: Vec<Participant>) -> Result<Self, DomainError> {
        if !(1..=MAX_ROUNDS_CAP).contains(&max_rounds) {
            return Err(DomainError::InvalidMaxRounds {
                got: max_rounds,
                max: MAX_ROUNDS_CAP,
            });
        }
        Ok(Self {
            current_round: 0,
            max_rounds,
            status: DiscussionStatus::Pending,
            participants,
            rounds: Vec::new(),
        })
    }

    pub fn total_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_final_round(&self) -> bool {
        self.current_round >= self.max_rounds
    }

    /// Open the next round with the rotated speaker order.
    ///
    /// Closes the previous round first if the caller forgot to.
    pub fn begin_round(&mut self) -> &mut Round {
        self.close_round();
        self.status = DiscussionStatus::Running;
        self.current_round += 1;
        let speakers = speaking_order(&self.participants, self.current_round);
        self.rounds.push(Round::new(self.current_round, speakers));
        let last = self.rounds.len() - 1;
        &mut self.rounds[last]
    }

    /// Newest round, while still open
    pub fn open_round_mut(&mut self) -> Option<&mut Round> {
        self.rounds.last_mut().filter(|r| !r.is_closed())
    }

    pub fn last_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn close_round(&mut self) {
        if let Some(round) = self.open_round_mut() {
            round.ended_at = Some(Utc::now());
        }
    }

    pub fn finish(&mut self, status: DiscussionStatus) {
        self.close_round();
        self.status = status;
    }
}

/// Speaker order for a round: `members` rotated left by `(round - 1) mod n`.
///
/// Over any `n` consecutive rounds each member leads exactly once.
pub fn speaking_order<T: Clone>(members: &[T], round: u32) -> Vec<T> {
    if members.is_empty() {
        return Vec::new();
    }
    let offset = (round.saturating_sub(1) as usize) % members.len();
    let mut order = members.to_vec();
    order.rotate_left(offset);
    order
}
