use anchor_lang::prelude::*;

use crate::eto::EtoPhase;
use crate::{PoolError, BPS_DENOMINATOR, MAX_COMMISSION_BPS};

// ============================================================================
// POOL TOTALS
// ============================================================================

/// Pool-wide accounting, stored inside the pool account.
/// total_received == total_committed + uncommitted() at all times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct PoolTotals {
    /// Sum of every accepted deposit
    pub total_received: u64,
    /// Sum forwarded to the offering across all batches
    pub total_committed: u64,
    /// Payment tokens already handed back (refunds and residues)
    pub total_paid_out: u64,
    /// Number of non-empty batches forwarded so far
    pub batch_count: u64,
}

impl PoolTotals {
    pub const SIZE: usize = 8 + 8 + 8 + 8;

    /// Balance received but not yet forwarded to the offering
    pub fn uncommitted(&self) -> u64 {
        self.total_received.saturating_sub(self.total_committed)
    }

    /// Credit a deposit to both the contributor and the pool.
    /// Nothing is written unless every addition succeeds.
    pub fn record_contribution(
        &mut self,
        record: &mut ContributorRecord,
        amount: u64,
    ) -> std::result::Result<(), PoolError> {
        let total_received = self.total_received.checked_add(amount).ok_or(PoolError::Overflow)?;

        // Roll anything an earlier batch already forwarded into the committed bucket
        let mut updated = *record;
        updated.settle(self);
        updated.contributed_total = updated.contributed_total.checked_add(amount).ok_or(PoolError::Overflow)?;
        updated.pending_amount = updated.pending_amount.checked_add(amount).ok_or(PoolError::Overflow)?;
        updated.pending_batch = self.batch_count;

        *record = updated;
        self.total_received = total_received;
        Ok(())
    }

    /// Record a forwarded batch. Returns the batch number, or None for an empty batch.
    pub fn mark_committed(&mut self, amount: u64) -> std::result::Result<Option<u64>, PoolError> {
        require_ledger(amount <= self.uncommitted(), PoolError::CommitExceedsBalance)?;
        if amount == 0 {
            return Ok(None);
        }

        self.total_committed = self.total_committed.checked_add(amount).ok_or(PoolError::Overflow)?;
        self.batch_count = self.batch_count.checked_add(1).ok_or(PoolError::Overflow)?;
        Ok(Some(self.batch_count))
    }

    fn record_payout(&mut self, amount: u64) -> std::result::Result<(), PoolError> {
        self.total_paid_out = self.total_paid_out.checked_add(amount).ok_or(PoolError::Overflow)?;
        Ok(())
    }
}

// ============================================================================
// CONTRIBUTOR RECORD
// ============================================================================

/// Per-contributor accounting.
///
/// Batches always forward the whole uncommitted balance, so every deposit made
/// while `batch_count == n` is committed as soon as batch `n + 1` exists. The
/// record keeps those deposits in `pending_amount` tagged with `pending_batch`
/// and lets readers derive the committed split from the pool totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct ContributorRecord {
    pub contributed_total: u64,
    /// Deposits known to be forwarded (settled lazily)
    pub committed_amount: u64,
    /// Deposits made since the last settlement
    pub pending_amount: u64,
    /// Pool batch counter observed when `pending_amount` was last written
    pub pending_batch: u64,
    pub rewards_claimed: bool,
    pub refund_claimed: bool,
}

impl ContributorRecord {
    pub const SIZE: usize = 8 + 8 + 8 + 8 + 1 + 1;

    /// Portion of this contributor's funds that reached the offering
    pub fn committed(&self, totals: &PoolTotals) -> u64 {
        if totals.batch_count > self.pending_batch {
            self.committed_amount.saturating_add(self.pending_amount)
        } else {
            self.committed_amount
        }
    }

    /// Portion still sitting in the pool's payment vault
    pub fn uncommitted(&self, totals: &PoolTotals) -> u64 {
        self.contributed_total.saturating_sub(self.committed(totals))
    }

    pub fn has_claimed(&self) -> bool {
        self.rewards_claimed || self.refund_claimed
    }

    fn settle(&mut self, totals: &PoolTotals) {
        if totals.batch_count > self.pending_batch {
            self.committed_amount = self.committed_amount.saturating_add(self.pending_amount);
            self.pending_amount = 0;
            self.pending_batch = totals.batch_count;
        }
    }
}

// ============================================================================
// DEPOSIT VALIDATION
// ============================================================================

/// Everything the receiver hook needs to accept or reject one deposit
#[derive(Clone, Copy, Debug)]
pub struct DepositCheck {
    /// Mint of the tokens being sent
    pub mint: Pubkey,
    /// Mint the pool is denominated in
    pub payment_mint: Pubkey,
    pub phase: EtoPhase,
    /// Registry verdict for the sender
    pub sender_verified: bool,
    pub amount: u64,
    pub minimum_cap: u64,
    /// Offering per-ticket bound; 0 means unbounded
    pub max_ticket: u64,
}

/// Validate a deposit. Checks run in a fixed order and the first failure wins.
pub fn validate_deposit(check: &DepositCheck) -> std::result::Result<(), PoolError> {
    require_ledger(check.mint == check.payment_mint, PoolError::WrongToken)?;
    require_ledger(check.phase.accepts_contributions(), PoolError::OfferingNotPublic)?;
    require_ledger(check.sender_verified, PoolError::ContributorNotVerified)?;
    require_ledger(check.amount >= check.minimum_cap, PoolError::BelowMinimumCap)?;
    require_ledger(
        check.max_ticket == 0 || check.amount <= check.max_ticket,
        PoolError::AboveMaximumTicket,
    )?;
    Ok(())
}

// ============================================================================
// SETTLEMENT
// ============================================================================

/// Reward and refund bookkeeping after the offering has concluded
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct Settlement {
    /// Equity token balance when the pool pulled its allocation
    pub equity_snapshot: u64,
    /// Bonus token balance when the pool pulled its allocation
    pub bonus_snapshot: u64,
    pub equity_commission: u64,
    pub bonus_commission: u64,
    pub rewards_pulled: bool,
    pub refund_pulled: bool,
    pub commission_claimed: bool,
}

/// What one contributor receives on the success path
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewardShare {
    pub equity: u64,
    pub bonus: u64,
    /// Never-forwarded payment tokens returned alongside the rewards
    pub residue: u64,
}

impl Settlement {
    pub const SIZE: usize = 8 + 8 + 8 + 8 + 1 + 1 + 1;

    /// Preconditions for pulling the reward allocation out of the offering
    pub fn check_reward_pull(&self, phase: EtoPhase) -> std::result::Result<(), PoolError> {
        require_ledger(phase.is_success(), PoolError::OfferingNotSucceeded)?;
        require_ledger(!self.rewards_pulled, PoolError::RewardsAlreadyPulled)
    }

    /// Preconditions for pulling committed funds back out of a failed offering
    pub fn check_refund_pull(&self, phase: EtoPhase) -> std::result::Result<(), PoolError> {
        require_ledger(phase.is_refunding(), PoolError::OfferingNotRefunding)?;
        require_ledger(!self.refund_pulled, PoolError::RefundAlreadyPulled)
    }

    /// Freeze the reward balances and reserve the commission out of them
    pub fn open_rewards(
        &mut self,
        phase: EtoPhase,
        equity_balance: u64,
        bonus_balance: u64,
        commission_bps: u64,
    ) -> std::result::Result<(), PoolError> {
        self.check_reward_pull(phase)?;
        require_ledger(commission_bps <= BPS_DENOMINATOR, PoolError::InvalidCommission)?;

        self.equity_commission = pro_rata(equity_balance, commission_bps, BPS_DENOMINATOR)?;
        self.bonus_commission = pro_rata(bonus_balance, commission_bps, BPS_DENOMINATOR)?;
        self.equity_snapshot = equity_balance;
        self.bonus_snapshot = bonus_balance;
        self.rewards_pulled = true;
        Ok(())
    }

    /// Mark the committed funds as returned by a failed offering
    pub fn open_refunds(&mut self, phase: EtoPhase) -> std::result::Result<(), PoolError> {
        self.check_refund_pull(phase)?;
        self.refund_pulled = true;
        Ok(())
    }

    pub fn distributable_equity(&self) -> u64 {
        self.equity_snapshot.saturating_sub(self.equity_commission)
    }

    pub fn distributable_bonus(&self) -> u64 {
        self.bonus_snapshot.saturating_sub(self.bonus_commission)
    }

    /// Quote a contributor's share without touching any state
    pub fn reward_share(
        &self,
        record: &ContributorRecord,
        totals: &PoolTotals,
    ) -> std::result::Result<RewardShare, PoolError> {
        let committed = record.committed(totals);
        Ok(RewardShare {
            equity: pro_rata(self.distributable_equity(), committed, totals.total_committed)?,
            bonus: pro_rata(self.distributable_bonus(), committed, totals.total_committed)?,
            residue: record.uncommitted(totals),
        })
    }

    /// Success path: pay the proportional reward share plus any uncommitted residue.
    /// A pool that never committed pays the residue alone, pulled or not.
    pub fn claim_rewards(
        &self,
        phase: EtoPhase,
        record: &mut ContributorRecord,
        totals: &mut PoolTotals,
    ) -> std::result::Result<RewardShare, PoolError> {
        require_ledger(phase.is_success(), PoolError::OfferingNotSucceeded)?;
        // With nothing committed there is no allocation to wait for, only the residue
        require_ledger(
            self.rewards_pulled || totals.total_committed == 0,
            PoolError::RewardsNotPulled,
        )?;
        require_ledger(!record.has_claimed(), PoolError::AlreadyClaimed)?;

        let share = self.reward_share(record, totals)?;
        totals.record_payout(share.residue)?;
        record.rewards_claimed = true;
        Ok(share)
    }

    /// Failure path: pay back the whole contribution, committed or not
    pub fn claim_refund(
        &self,
        phase: EtoPhase,
        record: &mut ContributorRecord,
        totals: &mut PoolTotals,
    ) -> std::result::Result<u64, PoolError> {
        require_ledger(phase.is_refunding(), PoolError::OfferingNotRefunding)?;
        require_ledger(
            self.refund_pulled || totals.total_committed == 0,
            PoolError::RefundNotPulled,
        )?;
        require_ledger(!record.has_claimed(), PoolError::AlreadyClaimed)?;

        let amount = record.contributed_total;
        totals.record_payout(amount)?;
        record.refund_claimed = true;
        Ok(amount)
    }

    /// Returns the (equity, bonus) commission owed to the beneficiary
    pub fn claim_commission(&mut self, phase: EtoPhase) -> std::result::Result<(u64, u64), PoolError> {
        require_ledger(phase.is_success(), PoolError::OfferingNotSucceeded)?;
        require_ledger(self.rewards_pulled, PoolError::RewardsNotPulled)?;
        require_ledger(!self.commission_claimed, PoolError::CommissionAlreadyClaimed)?;

        self.commission_claimed = true;
        Ok((self.equity_commission, self.bonus_commission))
    }
}

// ============================================================================
// ADMINISTRATION
// ============================================================================

/// Parameters fixed at pool creation
pub fn validate_pool_config(
    minimum_cap: u64,
    commission_bps: u64,
    commission_beneficiary: &Pubkey,
) -> std::result::Result<(), PoolError> {
    require_ledger(minimum_cap > 0, PoolError::InvalidMinimumCap)?;
    require_ledger(commission_bps <= MAX_COMMISSION_BPS, PoolError::InvalidCommission)?;
    validate_beneficiary(commission_beneficiary)
}

pub fn validate_beneficiary(beneficiary: &Pubkey) -> std::result::Result<(), PoolError> {
    require_ledger(*beneficiary != Pubkey::default(), PoolError::InvalidBeneficiary)
}

/// Who may administer the pool and who collects the commission
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct PoolRoles {
    pub owner: Pubkey,
    /// Pending owner for two-step transfer
    pub pending_owner: Option<Pubkey>,
    pub commission_beneficiary: Pubkey,
}

impl PoolRoles {
    pub const SIZE: usize = 32 + 33 + 32;

    pub fn new(owner: Pubkey, commission_beneficiary: Pubkey) -> std::result::Result<Self, PoolError> {
        validate_beneficiary(&commission_beneficiary)?;
        Ok(PoolRoles { owner, pending_owner: None, commission_beneficiary })
    }

    pub fn is_owner(&self, caller: &Pubkey) -> bool {
        self.owner == *caller
    }

    pub fn is_beneficiary(&self, caller: &Pubkey) -> bool {
        self.commission_beneficiary == *caller
    }

    pub fn propose_owner(&mut self, new_owner: Pubkey) -> std::result::Result<(), PoolError> {
        require_ledger(new_owner != Pubkey::default(), PoolError::InvalidOwner)?;
        self.pending_owner = Some(new_owner);
        Ok(())
    }

    /// Completes a transfer started by `propose_owner`. Returns the previous owner.
    pub fn accept_owner(&mut self, caller: &Pubkey) -> std::result::Result<Pubkey, PoolError> {
        let pending = self.pending_owner.ok_or(PoolError::NoPendingOwner)?;
        require_ledger(pending == *caller, PoolError::Unauthorized)?;

        let old_owner = self.owner;
        self.owner = pending;
        self.pending_owner = None;
        Ok(old_owner)
    }

    /// Returns the proposal that was dropped
    pub fn cancel_owner_transfer(&mut self) -> std::result::Result<Pubkey, PoolError> {
        self.pending_owner.take().ok_or(PoolError::NoPendingOwner)
    }

    /// Returns the previous beneficiary
    pub fn set_commission_beneficiary(&mut self, beneficiary: Pubkey) -> std::result::Result<Pubkey, PoolError> {
        validate_beneficiary(&beneficiary)?;
        Ok(std::mem::replace(&mut self.commission_beneficiary, beneficiary))
    }
}

// ============================================================================
// MATH
// ============================================================================

/// floor(amount * numerator / denominator) in u128. A zero denominator yields zero.
pub fn pro_rata(amount: u64, numerator: u64, denominator: u64) -> std::result::Result<u64, PoolError> {
    if denominator == 0 {
        return Ok(0);
    }
    let share = (amount as u128)
        .checked_mul(numerator as u128)
        .ok_or(PoolError::Overflow)?
        .checked_div(denominator as u128)
        .ok_or(PoolError::Overflow)?;
    u64::try_from(share).map_err(|_| PoolError::Overflow)
}

fn require_ledger(condition: bool, error: PoolError) -> std::result::Result<(), PoolError> {
    if condition {
        Ok(())
    } else {
        Err(error)
    }
}
