use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::program::invoke_signed;
use std::fmt;

use crate::PoolError;

// ============================================================================
// DISCRIMINATORS
// ============================================================================

/// sha256("account:EtoState")[..8]
pub const ETO_STATE_DISCRIMINATOR: [u8; 8] = [71, 245, 162, 211, 178, 190, 225, 113];

/// sha256("account:IdentityClaims")[..8]
pub const IDENTITY_CLAIMS_DISCRIMINATOR: [u8; 8] = [44, 14, 189, 44, 195, 95, 231, 99];

/// sha256("global:commit")[..8]
pub const COMMIT_INSTRUCTION: [u8; 8] = [223, 140, 142, 165, 229, 208, 156, 74];

/// sha256("global:claim")[..8]
pub const CLAIM_INSTRUCTION: [u8; 8] = [62, 198, 214, 193, 213, 159, 108, 210];

/// sha256("global:refund")[..8]
pub const REFUND_INSTRUCTION: [u8; 8] = [2, 96, 183, 251, 63, 208, 46, 46];

// ============================================================================
// OFFERING STATE
// ============================================================================

/// Phase of the external offering. The pool only reads it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub enum EtoPhase {
    Setup,
    Whitelist,
    Public,
    Signing,
    Claim,
    Payout,
    Refund,
}

impl EtoPhase {
    pub const COUNT: usize = 7;

    /// Only the public phase takes pool deposits
    pub fn accepts_contributions(&self) -> bool {
        *self == EtoPhase::Public
    }

    /// Terminal phases reached by a funded offering
    pub fn is_success(&self) -> bool {
        matches!(self, EtoPhase::Claim | EtoPhase::Payout)
    }

    pub fn is_refunding(&self) -> bool {
        *self == EtoPhase::Refund
    }
}

impl Default for EtoPhase {
    fn default() -> Self { EtoPhase::Setup }
}

impl fmt::Display for EtoPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtoPhase::Setup => write!(f, "Setup"),
            EtoPhase::Whitelist => write!(f, "Whitelist"),
            EtoPhase::Public => write!(f, "Public"),
            EtoPhase::Signing => write!(f, "Signing"),
            EtoPhase::Claim => write!(f, "Claim"),
            EtoPhase::Payout => write!(f, "Payout"),
            EtoPhase::Refund => write!(f, "Refund"),
        }
    }
}

/// Investment terms published by the offering
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct EtoTerms {
    /// Smallest ticket the offering accepts from one investor
    pub min_ticket: u64,
    /// Largest single ticket; 0 means unbounded
    pub max_ticket: u64,
    /// Payment units per equity token
    pub equity_token_price: u64,
}

/// Layout of the offering's state account (after the 8 byte discriminator)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct EtoState {
    pub phase: EtoPhase,
    /// Unix timestamp at which each phase starts, indexed by phase
    pub phase_started_at: [i64; EtoPhase::COUNT],
    pub terms: EtoTerms,
}

impl EtoState {
    /// Decode raw account data. Trailing bytes belong to the offering and are ignored.
    pub fn decode(data: &[u8]) -> std::result::Result<Self, PoolError> {
        if data.len() < 8 || data[..8] != ETO_STATE_DISCRIMINATOR {
            return Err(PoolError::InvalidOffering);
        }
        let mut body = &data[8..];
        EtoState::deserialize(&mut body).map_err(|_| PoolError::InvalidOffering)
    }

    /// Fresh read of the offering state; never cached between instructions
    pub fn load(account: &AccountInfo, eto_program: &Pubkey) -> Result<Self> {
        require_keys_eq!(*account.owner, *eto_program, PoolError::InvalidOffering);
        let data = account.try_borrow_data()?;
        Ok(Self::decode(&data)?)
    }

    pub fn phase_start(&self, phase: EtoPhase) -> i64 {
        self.phase_started_at[phase as usize]
    }
}

// ============================================================================
// IDENTITY REGISTRY
// ============================================================================

/// Claims the identity registry keeps for one address
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct IdentityClaims {
    pub subject: Pubkey,
    pub claims: u32,
}

impl IdentityClaims {
    pub const VERIFIED: u32 = 1;
    pub const SOPHISTICATED_INVESTOR: u32 = 1 << 1;
    pub const BANK_ACCOUNT: u32 = 1 << 2;
    pub const ACCOUNT_FROZEN: u32 = 1 << 3;

    pub fn decode(data: &[u8]) -> std::result::Result<Self, PoolError> {
        if data.len() < 8 || data[..8] != IDENTITY_CLAIMS_DISCRIMINATOR {
            return Err(PoolError::InvalidIdentityClaims);
        }
        let mut body = &data[8..];
        IdentityClaims::deserialize(&mut body).map_err(|_| PoolError::InvalidIdentityClaims)
    }

    pub fn load(account: &AccountInfo, registry_program: &Pubkey) -> Result<Self> {
        require_keys_eq!(*account.owner, *registry_program, PoolError::InvalidIdentityClaims);
        let data = account.try_borrow_data()?;
        Ok(Self::decode(&data)?)
    }

    /// Verified, not frozen, and issued for `sender`
    pub fn authorizes(&self, sender: &Pubkey) -> bool {
        self.subject == *sender
            && self.claims & Self::VERIFIED != 0
            && self.claims & Self::ACCOUNT_FROZEN == 0
    }
}

// ============================================================================
// OFFERING CPI
// ============================================================================

/// Accounts shared by every call into the offering program.
/// `remaining_accounts` carries whatever offering-owned accounts its entry point needs.
pub struct OfferingCall<'a, 'info> {
    pub eto_program: &'a AccountInfo<'info>,
    pub eto_state: &'a AccountInfo<'info>,
    /// The pool PDA, signing as the investor
    pub investor: &'a AccountInfo<'info>,
    pub token_program: &'a AccountInfo<'info>,
    pub remaining_accounts: &'a [AccountInfo<'info>],
}

/// Forward `amount` from the pool's payment vault into the offering
pub fn commit<'info>(
    call: OfferingCall<'_, 'info>,
    payment_vault: &AccountInfo<'info>,
    amount: u64,
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    let mut data = COMMIT_INSTRUCTION.to_vec();
    data.extend_from_slice(&amount.to_le_bytes());
    invoke_offering(call, &[payment_vault], data, signer_seeds)
}

/// Pull the pool's equity and bonus allocation
pub fn claim<'info>(
    call: OfferingCall<'_, 'info>,
    equity_vault: &AccountInfo<'info>,
    bonus_vault: &AccountInfo<'info>,
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    invoke_offering(call, &[equity_vault, bonus_vault], CLAIM_INSTRUCTION.to_vec(), signer_seeds)
}

/// Pull committed payment tokens back from a failed offering
pub fn refund<'info>(
    call: OfferingCall<'_, 'info>,
    payment_vault: &AccountInfo<'info>,
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    invoke_offering(call, &[payment_vault], REFUND_INSTRUCTION.to_vec(), signer_seeds)
}

fn invoke_offering<'info>(
    call: OfferingCall<'_, 'info>,
    vaults: &[&AccountInfo<'info>],
    data: Vec<u8>,
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    let mut metas = vec![
        AccountMeta::new(*call.eto_state.key, false),
        AccountMeta::new_readonly(*call.investor.key, true),
    ];
    let mut infos = vec![call.eto_state.clone(), call.investor.clone()];

    for vault in vaults {
        metas.push(AccountMeta::new(*vault.key, false));
        infos.push((*vault).clone());
    }

    metas.push(AccountMeta::new_readonly(*call.token_program.key, false));
    infos.push(call.token_program.clone());

    for account in call.remaining_accounts {
        metas.push(AccountMeta {
            pubkey: *account.key,
            is_signer: account.is_signer,
            is_writable: account.is_writable,
        });
        infos.push(account.clone());
    }
    infos.push(call.eto_program.clone());

    let ix = Instruction {
        program_id: *call.eto_program.key,
        accounts: metas,
        data,
    };
    invoke_signed(&ix, &infos, signer_seeds)?;
    Ok(())
}
