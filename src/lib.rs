use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};

pub mod eto;
pub mod ledger;

use eto::{EtoPhase, EtoState, IdentityClaims, OfferingCall};
use ledger::{ContributorRecord, DepositCheck, PoolRoles, PoolTotals, Settlement};

declare_id!("4SWxTy7VbiuajUwFnpUKndDEkCYYgCewADPdcuN53Hyz");

// ============================================================================
// CONSTANTS
// ============================================================================

/// Basis points denominator
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Upper bound on the beneficiary's cut of the reward tokens (20%)
pub const MAX_COMMISSION_BPS: u64 = 2_000;

/// Pool seed prefix; the pool PDA is derived from the offering it serves
pub const POOL_SEED: &[u8] = b"investment_pool";

/// Contribution record seed prefix
pub const CONTRIBUTION_SEED: &[u8] = b"contribution";

/// Vault seed prefixes
pub const PAYMENT_VAULT_SEED: &[u8] = b"payment_vault";
pub const EQUITY_VAULT_SEED: &[u8] = b"equity_vault";
pub const BONUS_VAULT_SEED: &[u8] = b"bonus_vault";

#[program]
pub mod investment_pool {
    use super::*;

    /// Create a pool bound to one offering for its whole life.
    /// The payer becomes the owner.
    pub fn initialize_pool(
        ctx: Context<InitializePool>,
        minimum_cap: u64,
        commission_bps: u64,
        commission_beneficiary: Pubkey,
    ) -> Result<()> {
        ledger::validate_pool_config(minimum_cap, commission_bps, &commission_beneficiary)?;

        // Refuse anything that does not decode as a state account of the given offering program
        let eto = EtoState::load(&ctx.accounts.eto_state, ctx.accounts.eto_program.key)?;

        let pool = &mut ctx.accounts.pool;
        pool.roles = PoolRoles::new(ctx.accounts.owner.key(), commission_beneficiary)?;
        pool.eto = ctx.accounts.eto_state.key();
        pool.eto_program = ctx.accounts.eto_program.key();
        pool.identity_registry = ctx.accounts.identity_registry.key();
        pool.payment_mint = ctx.accounts.payment_mint.key();
        pool.equity_mint = ctx.accounts.equity_mint.key();
        pool.bonus_mint = ctx.accounts.bonus_mint.key();
        pool.payment_vault = ctx.accounts.payment_vault.key();
        pool.equity_vault = ctx.accounts.equity_vault.key();
        pool.bonus_vault = ctx.accounts.bonus_vault.key();
        pool.minimum_cap = minimum_cap;
        pool.commission_bps = commission_bps;
        pool.totals = PoolTotals::default();
        pool.settlement = Settlement::default();
        pool.created_at = Clock::get()?.unix_timestamp;
        pool.bump = ctx.bumps.pool;
        pool.payment_vault_bump = ctx.bumps.payment_vault;
        pool.equity_vault_bump = ctx.bumps.equity_vault;
        pool.bonus_vault_bump = ctx.bumps.bonus_vault;

        emit!(PoolInitialized {
            pool: pool.key(),
            owner: pool.roles.owner,
            eto: pool.eto,
            payment_mint: pool.payment_mint,
            minimum_cap,
            commission_bps,
            commission_beneficiary,
            eto_phase: eto.phase.to_string(),
            eto_min_ticket: eto.terms.min_ticket,
            eto_max_ticket: eto.terms.max_ticket,
            equity_token_price: eto.terms.equity_token_price,
            public_phase_starts_at: eto.phase_start(EtoPhase::Public),
        });

        Ok(())
    }

    /// Propose a new owner (two-step transfer).
    /// The new owner must call accept_owner to complete the transfer
    pub fn propose_owner(ctx: Context<OwnerOnly>, new_owner: Pubkey) -> Result<()> {
        let pool = &mut ctx.accounts.pool;
        pool.roles.propose_owner(new_owner)?;

        emit!(OwnerProposed {
            pool: pool.key(),
            current_owner: pool.roles.owner,
            proposed_owner: new_owner,
            proposed_at: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }

    /// Accept ownership (must be called by the pending owner)
    pub fn accept_owner(ctx: Context<AcceptOwner>) -> Result<()> {
        let pool = &mut ctx.accounts.pool;

        let old_owner = pool.roles.accept_owner(&ctx.accounts.new_owner.key())?;

        emit!(OwnerTransferred {
            pool: pool.key(),
            old_owner,
            new_owner: pool.roles.owner,
            transferred_at: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }

    /// Cancel a pending ownership transfer (current owner only)
    pub fn cancel_owner_transfer(ctx: Context<OwnerOnly>) -> Result<()> {
        let pool = &mut ctx.accounts.pool;

        let cancelled_pending = pool.roles.cancel_owner_transfer()?;

        emit!(OwnerTransferCancelled {
            pool: pool.key(),
            owner: pool.roles.owner,
            cancelled_pending,
            cancelled_at: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }

    /// Point commission payouts at a new beneficiary (owner only, never the zero address)
    pub fn set_commission_beneficiary(ctx: Context<OwnerOnly>, new_beneficiary: Pubkey) -> Result<()> {
        let pool = &mut ctx.accounts.pool;
        let old_beneficiary = pool.roles.set_commission_beneficiary(new_beneficiary)?;

        emit!(CommissionBeneficiaryUpdated {
            pool: pool.key(),
            old_beneficiary,
            new_beneficiary,
        });

        Ok(())
    }

    /// Receive a contribution in the payment token.
    /// Rejects the whole transfer on the first failed check; nothing is credited partially.
    pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<()> {
        let contributor_key = ctx.accounts.contributor.key();
        let pool = &mut ctx.accounts.pool;
        let contribution = &mut ctx.accounts.contribution;

        let eto = EtoState::load(&ctx.accounts.eto_state, &pool.eto_program)?;
        // A missing or foreign claims account reads as "not verified"
        let sender_verified = IdentityClaims::load(&ctx.accounts.identity_claims, &pool.identity_registry)
            .map(|claims| claims.authorizes(&contributor_key))
            .unwrap_or(false);

        ledger::validate_deposit(&DepositCheck {
            mint: ctx.accounts.contributor_token_account.mint,
            payment_mint: pool.payment_mint,
            phase: eto.phase,
            sender_verified,
            amount,
            minimum_cap: pool.minimum_cap,
            max_ticket: eto.terms.max_ticket,
        })?;

        let now = Clock::get()?.unix_timestamp;
        if contribution.contributor == Pubkey::default() {
            contribution.pool = pool.key();
            contribution.contributor = contributor_key;
            contribution.record = ContributorRecord::default();
            contribution.first_contributed_at = now;
            contribution.bump = ctx.bumps.contribution;
        }

        // Effects before interactions; a failed transfer reverts both
        pool.totals.record_contribution(&mut contribution.record, amount)?;
        contribution.last_contributed_at = now;

        let cpi_accounts = Transfer {
            from: ctx.accounts.contributor_token_account.to_account_info(),
            to: ctx.accounts.payment_vault.to_account_info(),
            authority: ctx.accounts.contributor.to_account_info(),
        };
        let cpi_ctx = CpiContext::new(ctx.accounts.token_program.to_account_info(), cpi_accounts);
        token::transfer(cpi_ctx, amount)?;

        emit!(ContributionReceived {
            pool: pool.key(),
            contributor: contributor_key,
            amount,
            contributed_total: contribution.record.contributed_total,
            total_received: pool.totals.total_received,
            received_at: now,
        });

        Ok(())
    }

    /// Forward the whole uncommitted balance to the offering (owner only).
    /// An empty batch is a successful no-op.
    pub fn commit_funds<'info>(ctx: Context<'_, '_, '_, 'info, CommitFunds<'info>>) -> Result<()> {
        let pool = &mut ctx.accounts.pool;
        let amount = pool.totals.uncommitted();
        if amount == 0 {
            msg!("Nothing to commit");
            return Ok(());
        }

        let balance_before = ctx.accounts.payment_vault.amount;
        let eto_key = pool.eto;
        let bump = [pool.bump];
        let seeds = &[POOL_SEED, eto_key.as_ref(), &bump];
        let signer_seeds = &[&seeds[..]];

        eto::commit(
            OfferingCall {
                eto_program: &ctx.accounts.eto_program.to_account_info(),
                eto_state: &ctx.accounts.eto_state.to_account_info(),
                investor: &pool.to_account_info(),
                token_program: &ctx.accounts.token_program.to_account_info(),
                remaining_accounts: ctx.remaining_accounts,
            },
            &ctx.accounts.payment_vault.to_account_info(),
            amount,
            signer_seeds,
        )?;

        // The offering must have taken exactly the batch, no more and no less
        ctx.accounts.payment_vault.reload()?;
        let forwarded = balance_before
            .checked_sub(ctx.accounts.payment_vault.amount)
            .ok_or(PoolError::OfferingRejectedCommit)?;
        require!(forwarded == amount, PoolError::OfferingRejectedCommit);

        let batch = pool.totals.mark_committed(amount)?.unwrap_or_default();

        emit!(FundsCommitted {
            pool: pool.key(),
            amount,
            batch,
            total_committed: pool.totals.total_committed,
            committed_at: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }

    /// Pull the pool's reward allocation out of a successful offering (owner only, once).
    /// A pool that never committed has no allocation and settles with empty balances.
    pub fn claim_investment_pool_reward<'info>(
        ctx: Context<'_, '_, '_, 'info, ClaimPoolReward<'info>>,
    ) -> Result<()> {
        let pool = &mut ctx.accounts.pool;
        let eto = EtoState::load(&ctx.accounts.eto_state, &pool.eto_program)?;
        pool.settlement.check_reward_pull(eto.phase)?;

        let (equity_balance, bonus_balance) = if pool.totals.total_committed > 0 {
            let eto_key = pool.eto;
            let bump = [pool.bump];
            let seeds = &[POOL_SEED, eto_key.as_ref(), &bump];
            let signer_seeds = &[&seeds[..]];

            eto::claim(
                OfferingCall {
                    eto_program: &ctx.accounts.eto_program.to_account_info(),
                    eto_state: &ctx.accounts.eto_state.to_account_info(),
                    investor: &pool.to_account_info(),
                    token_program: &ctx.accounts.token_program.to_account_info(),
                    remaining_accounts: ctx.remaining_accounts,
                },
                &ctx.accounts.equity_vault.to_account_info(),
                &ctx.accounts.bonus_vault.to_account_info(),
                signer_seeds,
            )?;

            ctx.accounts.equity_vault.reload()?;
            ctx.accounts.bonus_vault.reload()?;
            (ctx.accounts.equity_vault.amount, ctx.accounts.bonus_vault.amount)
        } else {
            msg!("Nothing committed, no allocation to pull");
            (0, 0)
        };
        let commission_bps = pool.commission_bps;
        pool.settlement.open_rewards(eto.phase, equity_balance, bonus_balance, commission_bps)?;

        emit!(PoolRewardPulled {
            pool: pool.key(),
            equity_amount: equity_balance,
            bonus_amount: bonus_balance,
            equity_commission: pool.settlement.equity_commission,
            bonus_commission: pool.settlement.bonus_commission,
            pulled_at: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }

    /// Pull committed funds back out of a failed offering (anyone, once)
    pub fn claim_investment_pool_refund<'info>(
        ctx: Context<'_, '_, '_, 'info, ClaimPoolRefund<'info>>,
    ) -> Result<()> {
        let pool = &mut ctx.accounts.pool;
        let eto = EtoState::load(&ctx.accounts.eto_state, &pool.eto_program)?;
        pool.settlement.check_refund_pull(eto.phase)?;

        let expected = pool.totals.total_committed;
        if expected > 0 {
            let balance_before = ctx.accounts.payment_vault.amount;
            let eto_key = pool.eto;
            let bump = [pool.bump];
            let seeds = &[POOL_SEED, eto_key.as_ref(), &bump];
            let signer_seeds = &[&seeds[..]];

            eto::refund(
                OfferingCall {
                    eto_program: &ctx.accounts.eto_program.to_account_info(),
                    eto_state: &ctx.accounts.eto_state.to_account_info(),
                    investor: &pool.to_account_info(),
                    token_program: &ctx.accounts.token_program.to_account_info(),
                    remaining_accounts: ctx.remaining_accounts,
                },
                &ctx.accounts.payment_vault.to_account_info(),
                signer_seeds,
            )?;

            ctx.accounts.payment_vault.reload()?;
            let returned = ctx.accounts.payment_vault.amount
                .checked_sub(balance_before)
                .ok_or(PoolError::OfferingPayoutMismatch)?;
            require!(returned == expected, PoolError::OfferingPayoutMismatch);
        }

        pool.settlement.open_refunds(eto.phase)?;

        emit!(PoolRefundPulled {
            pool: pool.key(),
            amount: expected,
            caller: ctx.accounts.caller.key(),
            pulled_at: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }

    /// Contributor pulls their share of both reward tokens, plus any never-forwarded residue
    pub fn claim_rewards(ctx: Context<ClaimRewards>) -> Result<()> {
        let pool = &mut ctx.accounts.pool;
        let contribution = &mut ctx.accounts.contribution;
        let eto = EtoState::load(&ctx.accounts.eto_state, &pool.eto_program)?;

        let settlement = pool.settlement;
        let share = settlement.claim_rewards(eto.phase, &mut contribution.record, &mut pool.totals)?;

        let eto_key = pool.eto;
        let bump = [pool.bump];
        let seeds = &[POOL_SEED, eto_key.as_ref(), &bump];
        let signer_seeds = &[&seeds[..]];
        let authority = pool.to_account_info();
        let token_program = ctx.accounts.token_program.to_account_info();

        pay_out(
            &token_program,
            ctx.accounts.equity_vault.to_account_info(),
            ctx.accounts.contributor_equity_account.to_account_info(),
            authority.clone(),
            signer_seeds,
            share.equity,
        )?;
        pay_out(
            &token_program,
            ctx.accounts.bonus_vault.to_account_info(),
            ctx.accounts.contributor_bonus_account.to_account_info(),
            authority.clone(),
            signer_seeds,
            share.bonus,
        )?;
        pay_out(
            &token_program,
            ctx.accounts.payment_vault.to_account_info(),
            ctx.accounts.contributor_payment_account.to_account_info(),
            authority,
            signer_seeds,
            share.residue,
        )?;

        emit!(RewardsClaimed {
            pool: pool.key(),
            contributor: contribution.contributor,
            equity_amount: share.equity,
            bonus_amount: share.bonus,
            residue: share.residue,
            claimed_at: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }

    /// Contributor pulls back their whole contribution after a failed offering
    pub fn claim_refund(ctx: Context<ClaimRefund>) -> Result<()> {
        let pool = &mut ctx.accounts.pool;
        let contribution = &mut ctx.accounts.contribution;
        let eto = EtoState::load(&ctx.accounts.eto_state, &pool.eto_program)?;

        let settlement = pool.settlement;
        let amount = settlement.claim_refund(eto.phase, &mut contribution.record, &mut pool.totals)?;

        let eto_key = pool.eto;
        let bump = [pool.bump];
        let seeds = &[POOL_SEED, eto_key.as_ref(), &bump];
        let signer_seeds = &[&seeds[..]];

        pay_out(
            &ctx.accounts.token_program.to_account_info(),
            ctx.accounts.payment_vault.to_account_info(),
            ctx.accounts.contributor_payment_account.to_account_info(),
            pool.to_account_info(),
            signer_seeds,
            amount,
        )?;

        emit!(RefundClaimed {
            pool: pool.key(),
            contributor: contribution.contributor,
            amount,
            claimed_at: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }

    /// Beneficiary pulls the commission reserved when rewards were pulled
    pub fn claim_commission(ctx: Context<ClaimCommission>) -> Result<()> {
        let pool = &mut ctx.accounts.pool;
        let eto = EtoState::load(&ctx.accounts.eto_state, &pool.eto_program)?;

        let (equity_amount, bonus_amount) = pool.settlement.claim_commission(eto.phase)?;

        let eto_key = pool.eto;
        let bump = [pool.bump];
        let seeds = &[POOL_SEED, eto_key.as_ref(), &bump];
        let signer_seeds = &[&seeds[..]];
        let authority = pool.to_account_info();
        let token_program = ctx.accounts.token_program.to_account_info();

        pay_out(
            &token_program,
            ctx.accounts.equity_vault.to_account_info(),
            ctx.accounts.beneficiary_equity_account.to_account_info(),
            authority.clone(),
            signer_seeds,
            equity_amount,
        )?;
        pay_out(
            &token_program,
            ctx.accounts.bonus_vault.to_account_info(),
            ctx.accounts.beneficiary_bonus_account.to_account_info(),
            authority,
            signer_seeds,
            bonus_amount,
        )?;

        emit!(CommissionClaimed {
            pool: pool.key(),
            beneficiary: ctx.accounts.commission_beneficiary.key(),
            equity_amount,
            bonus_amount,
            claimed_at: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Vault transfer signed by the pool PDA. Zero amounts are skipped.
fn pay_out<'info>(
    token_program: &AccountInfo<'info>,
    from: AccountInfo<'info>,
    to: AccountInfo<'info>,
    authority: AccountInfo<'info>,
    signer_seeds: &[&[&[u8]]],
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let cpi_accounts = Transfer { from, to, authority };
    let cpi_ctx = CpiContext::new_with_signer(token_program.clone(), cpi_accounts, signer_seeds);
    token::transfer(cpi_ctx, amount)
}

// ============================================================================
// ACCOUNT STRUCTURES
// ============================================================================

#[account]
pub struct InvestmentPool {
    pub roles: PoolRoles,
    /// Offering state account this pool is bound to
    pub eto: Pubkey,
    pub eto_program: Pubkey,
    /// Program that owns identity claims accounts
    pub identity_registry: Pubkey,
    pub payment_mint: Pubkey,
    pub equity_mint: Pubkey,
    pub bonus_mint: Pubkey,
    pub payment_vault: Pubkey,
    pub equity_vault: Pubkey,
    pub bonus_vault: Pubkey,
    /// Smallest single deposit accepted
    pub minimum_cap: u64,
    /// Beneficiary cut of the reward tokens in basis points
    pub commission_bps: u64,
    pub totals: PoolTotals,
    pub settlement: Settlement,
    pub created_at: i64,
    pub bump: u8,
    pub payment_vault_bump: u8,
    pub equity_vault_bump: u8,
    pub bonus_vault_bump: u8,
}

impl InvestmentPool {
    // 8 (discriminator) + roles + 32*9 (pubkeys) + 8*2 (minimum_cap, commission_bps) +
    // totals + settlement + 8 (created_at) + 4 (bumps)
    pub const SIZE: usize =
        8 + PoolRoles::SIZE + 32 * 9 + 8 + 8 + PoolTotals::SIZE + Settlement::SIZE + 8 + 1 + 1 + 1 + 1;
}

/// One per (pool, contributor); created on first deposit and never closed
#[account]
pub struct Contribution {
    pub pool: Pubkey,
    pub contributor: Pubkey,
    pub record: ContributorRecord,
    pub first_contributed_at: i64,
    pub last_contributed_at: i64,
    pub bump: u8,
}

impl Contribution {
    pub const SIZE: usize = 8 + 32 + 32 + ContributorRecord::SIZE + 8 + 8 + 1;
}

// ============================================================================
// CONTEXT STRUCTURES
// ============================================================================

#[derive(Accounts)]
pub struct InitializePool<'info> {
    #[account(init, payer = owner, space = InvestmentPool::SIZE, seeds = [POOL_SEED, eto_state.key().as_ref()], bump)]
    pub pool: Box<Account<'info, InvestmentPool>>,
    #[account(init, payer = owner, token::mint = payment_mint, token::authority = pool, seeds = [PAYMENT_VAULT_SEED, pool.key().as_ref()], bump)]
    pub payment_vault: Box<Account<'info, TokenAccount>>,
    #[account(init, payer = owner, token::mint = equity_mint, token::authority = pool, seeds = [EQUITY_VAULT_SEED, pool.key().as_ref()], bump)]
    pub equity_vault: Box<Account<'info, TokenAccount>>,
    #[account(init, payer = owner, token::mint = bonus_mint, token::authority = pool, seeds = [BONUS_VAULT_SEED, pool.key().as_ref()], bump)]
    pub bonus_vault: Box<Account<'info, TokenAccount>>,
    pub payment_mint: Box<Account<'info, Mint>>,
    #[account(constraint = equity_mint.key() != payment_mint.key() @ PoolError::InvalidMint)]
    pub equity_mint: Box<Account<'info, Mint>>,
    #[account(
        constraint = bonus_mint.key() != payment_mint.key() @ PoolError::InvalidMint,
        constraint = bonus_mint.key() != equity_mint.key() @ PoolError::InvalidMint
    )]
    pub bonus_mint: Box<Account<'info, Mint>>,
    /// CHECK: Owner and layout are verified against eto_program in the handler
    pub eto_state: UncheckedAccount<'info>,
    /// CHECK: Offering program; only its id is stored
    #[account(executable)]
    pub eto_program: UncheckedAccount<'info>,
    /// CHECK: Identity registry program; only its id is stored
    #[account(executable)]
    pub identity_registry: UncheckedAccount<'info>,
    #[account(mut)]
    pub owner: Signer<'info>,
    pub system_program: Program<'info, System>,
    #[account(address = token::ID)]
    pub token_program: Program<'info, Token>,
}

/// Owner-gated configuration changes
#[derive(Accounts)]
pub struct OwnerOnly<'info> {
    #[account(
        mut,
        seeds = [POOL_SEED, pool.eto.as_ref()],
        bump = pool.bump,
        constraint = pool.roles.is_owner(&owner.key()) @ PoolError::Unauthorized
    )]
    pub pool: Account<'info, InvestmentPool>,
    pub owner: Signer<'info>,
}

/// Context for accepting ownership
#[derive(Accounts)]
pub struct AcceptOwner<'info> {
    #[account(mut, seeds = [POOL_SEED, pool.eto.as_ref()], bump = pool.bump)]
    pub pool: Account<'info, InvestmentPool>,
    pub new_owner: Signer<'info>,
}

#[derive(Accounts)]
pub struct Deposit<'info> {
    #[account(mut, seeds = [POOL_SEED, pool.eto.as_ref()], bump = pool.bump, has_one = payment_vault @ PoolError::InvalidVault)]
    pub pool: Box<Account<'info, InvestmentPool>>,
    #[account(
        init_if_needed,
        payer = contributor,
        space = Contribution::SIZE,
        seeds = [CONTRIBUTION_SEED, pool.key().as_ref(), contributor.key().as_ref()],
        bump
    )]
    pub contribution: Box<Account<'info, Contribution>>,
    #[account(mut, seeds = [PAYMENT_VAULT_SEED, pool.key().as_ref()], bump = pool.payment_vault_bump)]
    pub payment_vault: Box<Account<'info, TokenAccount>>,
    /// Mint is checked by the deposit validation so a wrong token gets a descriptive error
    #[account(mut, token::authority = contributor)]
    pub contributor_token_account: Box<Account<'info, TokenAccount>>,
    /// CHECK: Must be the pool's offering; decoded in the handler
    #[account(address = pool.eto @ PoolError::InvalidOffering)]
    pub eto_state: UncheckedAccount<'info>,
    /// CHECK: Owner and subject are verified in the handler
    pub identity_claims: UncheckedAccount<'info>,
    #[account(mut)]
    pub contributor: Signer<'info>,
    pub system_program: Program<'info, System>,
    #[account(address = token::ID)]
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct CommitFunds<'info> {
    #[account(
        mut,
        seeds = [POOL_SEED, pool.eto.as_ref()],
        bump = pool.bump,
        constraint = pool.roles.is_owner(&owner.key()) @ PoolError::Unauthorized,
        has_one = payment_vault @ PoolError::InvalidVault,
        has_one = eto_program @ PoolError::InvalidOffering
    )]
    pub pool: Box<Account<'info, InvestmentPool>>,
    #[account(mut, seeds = [PAYMENT_VAULT_SEED, pool.key().as_ref()], bump = pool.payment_vault_bump)]
    pub payment_vault: Box<Account<'info, TokenAccount>>,
    /// CHECK: Must be the pool's offering
    #[account(mut, address = pool.eto @ PoolError::InvalidOffering)]
    pub eto_state: UncheckedAccount<'info>,
    /// CHECK: Matched against the stored offering program id
    #[account(executable)]
    pub eto_program: UncheckedAccount<'info>,
    pub owner: Signer<'info>,
    #[account(address = token::ID)]
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct ClaimPoolReward<'info> {
    #[account(
        mut,
        seeds = [POOL_SEED, pool.eto.as_ref()],
        bump = pool.bump,
        constraint = pool.roles.is_owner(&owner.key()) @ PoolError::Unauthorized,
        has_one = equity_vault @ PoolError::InvalidVault,
        has_one = bonus_vault @ PoolError::InvalidVault,
        has_one = eto_program @ PoolError::InvalidOffering
    )]
    pub pool: Box<Account<'info, InvestmentPool>>,
    #[account(mut, seeds = [EQUITY_VAULT_SEED, pool.key().as_ref()], bump = pool.equity_vault_bump)]
    pub equity_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut, seeds = [BONUS_VAULT_SEED, pool.key().as_ref()], bump = pool.bonus_vault_bump)]
    pub bonus_vault: Box<Account<'info, TokenAccount>>,
    /// CHECK: Must be the pool's offering
    #[account(mut, address = pool.eto @ PoolError::InvalidOffering)]
    pub eto_state: UncheckedAccount<'info>,
    /// CHECK: Matched against the stored offering program id
    #[account(executable)]
    pub eto_program: UncheckedAccount<'info>,
    pub owner: Signer<'info>,
    #[account(address = token::ID)]
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct ClaimPoolRefund<'info> {
    #[account(
        mut,
        seeds = [POOL_SEED, pool.eto.as_ref()],
        bump = pool.bump,
        has_one = payment_vault @ PoolError::InvalidVault,
        has_one = eto_program @ PoolError::InvalidOffering
    )]
    pub pool: Box<Account<'info, InvestmentPool>>,
    #[account(mut, seeds = [PAYMENT_VAULT_SEED, pool.key().as_ref()], bump = pool.payment_vault_bump)]
    pub payment_vault: Box<Account<'info, TokenAccount>>,
    /// CHECK: Must be the pool's offering
    #[account(mut, address = pool.eto @ PoolError::InvalidOffering)]
    pub eto_state: UncheckedAccount<'info>,
    /// CHECK: Matched against the stored offering program id
    #[account(executable)]
    pub eto_program: UncheckedAccount<'info>,
    pub caller: Signer<'info>,
    #[account(address = token::ID)]
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct ClaimRewards<'info> {
    #[account(
        mut,
        seeds = [POOL_SEED, pool.eto.as_ref()],
        bump = pool.bump,
        has_one = payment_vault @ PoolError::InvalidVault,
        has_one = equity_vault @ PoolError::InvalidVault,
        has_one = bonus_vault @ PoolError::InvalidVault
    )]
    pub pool: Box<Account<'info, InvestmentPool>>,
    #[account(
        mut,
        seeds = [CONTRIBUTION_SEED, pool.key().as_ref(), contributor.key().as_ref()],
        bump = contribution.bump,
        has_one = pool @ PoolError::Unauthorized,
        has_one = contributor @ PoolError::Unauthorized
    )]
    pub contribution: Box<Account<'info, Contribution>>,
    #[account(mut, seeds = [PAYMENT_VAULT_SEED, pool.key().as_ref()], bump = pool.payment_vault_bump)]
    pub payment_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut, seeds = [EQUITY_VAULT_SEED, pool.key().as_ref()], bump = pool.equity_vault_bump)]
    pub equity_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut, seeds = [BONUS_VAULT_SEED, pool.key().as_ref()], bump = pool.bonus_vault_bump)]
    pub bonus_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut, token::mint = pool.payment_mint, token::authority = contributor)]
    pub contributor_payment_account: Box<Account<'info, TokenAccount>>,
    #[account(mut, token::mint = pool.equity_mint, token::authority = contributor)]
    pub contributor_equity_account: Box<Account<'info, TokenAccount>>,
    #[account(mut, token::mint = pool.bonus_mint, token::authority = contributor)]
    pub contributor_bonus_account: Box<Account<'info, TokenAccount>>,
    /// CHECK: Must be the pool's offering; decoded in the handler
    #[account(address = pool.eto @ PoolError::InvalidOffering)]
    pub eto_state: UncheckedAccount<'info>,
    pub contributor: Signer<'info>,
    #[account(address = token::ID)]
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct ClaimRefund<'info> {
    #[account(
        mut,
        seeds = [POOL_SEED, pool.eto.as_ref()],
        bump = pool.bump,
        has_one = payment_vault @ PoolError::InvalidVault
    )]
    pub pool: Box<Account<'info, InvestmentPool>>,
    #[account(
        mut,
        seeds = [CONTRIBUTION_SEED, pool.key().as_ref(), contributor.key().as_ref()],
        bump = contribution.bump,
        has_one = pool @ PoolError::Unauthorized,
        has_one = contributor @ PoolError::Unauthorized
    )]
    pub contribution: Box<Account<'info, Contribution>>,
    #[account(mut, seeds = [PAYMENT_VAULT_SEED, pool.key().as_ref()], bump = pool.payment_vault_bump)]
    pub payment_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut, token::mint = pool.payment_mint, token::authority = contributor)]
    pub contributor_payment_account: Box<Account<'info, TokenAccount>>,
    /// CHECK: Must be the pool's offering; decoded in the handler
    #[account(address = pool.eto @ PoolError::InvalidOffering)]
    pub eto_state: UncheckedAccount<'info>,
    pub contributor: Signer<'info>,
    #[account(address = token::ID)]
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct ClaimCommission<'info> {
    #[account(
        mut,
        seeds = [POOL_SEED, pool.eto.as_ref()],
        bump = pool.bump,
        constraint = pool.roles.is_beneficiary(&commission_beneficiary.key()) @ PoolError::Unauthorized,
        has_one = equity_vault @ PoolError::InvalidVault,
        has_one = bonus_vault @ PoolError::InvalidVault
    )]
    pub pool: Box<Account<'info, InvestmentPool>>,
    #[account(mut, seeds = [EQUITY_VAULT_SEED, pool.key().as_ref()], bump = pool.equity_vault_bump)]
    pub equity_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut, seeds = [BONUS_VAULT_SEED, pool.key().as_ref()], bump = pool.bonus_vault_bump)]
    pub bonus_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut, token::mint = pool.equity_mint, token::authority = commission_beneficiary)]
    pub beneficiary_equity_account: Box<Account<'info, TokenAccount>>,
    #[account(mut, token::mint = pool.bonus_mint, token::authority = commission_beneficiary)]
    pub beneficiary_bonus_account: Box<Account<'info, TokenAccount>>,
    /// CHECK: Must be the pool's offering; decoded in the handler
    #[account(address = pool.eto @ PoolError::InvalidOffering)]
    pub eto_state: UncheckedAccount<'info>,
    pub commission_beneficiary: Signer<'info>,
    #[account(address = token::ID)]
    pub token_program: Program<'info, Token>,
}

// ============================================================================
// EVENTS
// ============================================================================

#[event]
pub struct PoolInitialized {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub eto: Pubkey,
    pub payment_mint: Pubkey,
    pub minimum_cap: u64,
    pub commission_bps: u64,
    pub commission_beneficiary: Pubkey,
    pub eto_phase: String,
    pub eto_min_ticket: u64,
    pub eto_max_ticket: u64,
    pub equity_token_price: u64,
    pub public_phase_starts_at: i64,
}

#[event]
pub struct OwnerProposed {
    pub pool: Pubkey,
    pub current_owner: Pubkey,
    pub proposed_owner: Pubkey,
    pub proposed_at: i64,
}

#[event]
pub struct OwnerTransferred {
    pub pool: Pubkey,
    pub old_owner: Pubkey,
    pub new_owner: Pubkey,
    pub transferred_at: i64,
}

#[event]
pub struct OwnerTransferCancelled {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub cancelled_pending: Pubkey,
    pub cancelled_at: i64,
}

#[event]
pub struct CommissionBeneficiaryUpdated {
    pub pool: Pubkey,
    pub old_beneficiary: Pubkey,
    pub new_beneficiary: Pubkey,
}

#[event]
pub struct ContributionReceived {
    pub pool: Pubkey,
    pub contributor: Pubkey,
    pub amount: u64,
    pub contributed_total: u64,
    pub total_received: u64,
    pub received_at: i64,
}

#[event]
pub struct FundsCommitted {
    pub pool: Pubkey,
    pub amount: u64,
    pub batch: u64,
    pub total_committed: u64,
    pub committed_at: i64,
}

#[event]
pub struct PoolRewardPulled {
    pub pool: Pubkey,
    pub equity_amount: u64,
    pub bonus_amount: u64,
    pub equity_commission: u64,
    pub bonus_commission: u64,
    pub pulled_at: i64,
}

#[event]
pub struct PoolRefundPulled {
    pub pool: Pubkey,
    pub amount: u64,
    pub caller: Pubkey,
    pub pulled_at: i64,
}

#[event]
pub struct RewardsClaimed {
    pub pool: Pubkey,
    pub contributor: Pubkey,
    pub equity_amount: u64,
    pub bonus_amount: u64,
    pub residue: u64,
    pub claimed_at: i64,
}

#[event]
pub struct RefundClaimed {
    pub pool: Pubkey,
    pub contributor: Pubkey,
    pub amount: u64,
    pub claimed_at: i64,
}

#[event]
pub struct CommissionClaimed {
    pub pool: Pubkey,
    pub beneficiary: Pubkey,
    pub equity_amount: u64,
    pub bonus_amount: u64,
    pub claimed_at: i64,
}

// ============================================================================
// ERRORS
// ============================================================================

#[error_code]
pub enum PoolError {
    #[msg("Unauthorized: only authorized parties can perform this action")]
    Unauthorized,
    #[msg("Invalid owner address")]
    InvalidOwner,
    #[msg("No pending owner transfer")]
    NoPendingOwner,
    #[msg("wrong token")]
    WrongToken,
    #[msg("Offering is not in its public phase")]
    OfferingNotPublic,
    #[msg("Contributor is not verified by the identity registry")]
    ContributorNotVerified,
    #[msg("amount below minimum cap")]
    BelowMinimumCap,
    #[msg("Amount exceeds the offering's maximum ticket")]
    AboveMaximumTicket,
    #[msg("Commission beneficiary cannot be the zero address")]
    InvalidBeneficiary,
    #[msg("Minimum cap must be greater than zero")]
    InvalidMinimumCap,
    #[msg("Invalid commission value (must be 0-2000 basis points)")]
    InvalidCommission,
    #[msg("Offering has not reached a successful terminal phase")]
    OfferingNotSucceeded,
    #[msg("Offering is not refunding")]
    OfferingNotRefunding,
    #[msg("Pool has not pulled its reward allocation yet")]
    RewardsNotPulled,
    #[msg("Pool has not pulled its refund from the offering yet")]
    RefundNotPulled,
    #[msg("Reward allocation already pulled")]
    RewardsAlreadyPulled,
    #[msg("Refund already pulled")]
    RefundAlreadyPulled,
    #[msg("already claimed")]
    AlreadyClaimed,
    #[msg("Commission already claimed")]
    CommissionAlreadyClaimed,
    #[msg("Commit amount exceeds the uncommitted balance")]
    CommitExceedsBalance,
    #[msg("Offering did not accept the committed batch")]
    OfferingRejectedCommit,
    #[msg("Offering paid out an unexpected amount")]
    OfferingPayoutMismatch,
    #[msg("Invalid vault account")]
    InvalidVault,
    #[msg("Invalid mint account")]
    InvalidMint,
    #[msg("Account is not a state account of the configured offering")]
    InvalidOffering,
    #[msg("Account is not an identity claims account of the configured registry")]
    InvalidIdentityClaims,
    #[msg("Arithmetic overflow in calculation")]
    Overflow,
}
