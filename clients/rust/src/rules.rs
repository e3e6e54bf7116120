//! Client-side mirror of the program's stake lifecycle rules.
//!
//! The program enforces all of these. Checking them here keeps doomed
//! transactions from being built and signed. Open and deposit ordering is
//! left to the program so that violations surface as on-chain rejections.

use solana_sdk::pubkey::Pubkey;

use crate::accounts::{Goal, Stake};
use crate::errors::RuleViolation;
use crate::types::StakeStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    InitGoal,
    OpenStake,
    DepositStake,
    CancelBeforeStart,
    ResolveSuccess,
    ResolveFailure,
    CreateGoalAndStake,
}

impl ActionKind {
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::InitGoal => "init_goal",
            ActionKind::OpenStake => "open_stake",
            ActionKind::DepositStake => "deposit_stake",
            ActionKind::CancelBeforeStart => "cancel_before_start",
            ActionKind::ResolveSuccess => "resolve_success",
            ActionKind::ResolveFailure => "resolve_failure",
            ActionKind::CreateGoalAndStake => "create_goal_and_stake",
        }
    }
}

pub fn check_cancel(goal: &Goal, stake: &Stake, now: i64) -> Result<(), RuleViolation> {
    if goal.has_started(now) {
        return Err(RuleViolation::GoalAlreadyStarted {
            now,
            starts_on: goal.starts_on,
        });
    }
    match stake.status {
        StakeStatus::Pending | StakeStatus::Funded => Ok(()),
        actual => Err(RuleViolation::InvalidStakeStatus { actual }),
    }
}

pub fn check_resolve(goal: &Goal, stake: &Stake, now: i64) -> Result<(), RuleViolation> {
    if !goal.has_ended(now) {
        return Err(RuleViolation::GoalNotEnded {
            now,
            ends_on: goal.ends_on,
        });
    }
    if stake.status != StakeStatus::Funded {
        return Err(RuleViolation::InvalidStakeStatus {
            actual: stake.status,
        });
    }
    Ok(())
}

/// Only the goal's resolver may settle its stakes.
pub fn check_resolver(goal: &Goal, signer: &Pubkey) -> Result<(), RuleViolation> {
    if goal.resolver != *signer {
        return Err(RuleViolation::NotResolver {
            signer: *signer,
            resolver: goal.resolver,
        });
    }
    Ok(())
}

/// Actions `actor` can currently take on this goal.
pub fn allowed_actions(
    goal: &Goal,
    stake: Option<&Stake>,
    actor: &Pubkey,
    now: i64,
) -> Vec<ActionKind> {
    let mut actions = Vec::new();
    match stake {
        None => actions.push(ActionKind::OpenStake),
        Some(stake) => {
            if stake.status == StakeStatus::Pending {
                actions.push(ActionKind::DepositStake);
            }
            if stake.staker == *actor && check_cancel(goal, stake, now).is_ok() {
                actions.push(ActionKind::CancelBeforeStart);
            }
            if check_resolver(goal, actor).is_ok() && check_resolve(goal, stake, now).is_ok() {
                actions.push(ActionKind::ResolveSuccess);
                actions.push(ActionKind::ResolveFailure);
            }
        }
    }
    actions
}
