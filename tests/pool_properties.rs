// Property-based tests for the investment pool ledger.
// Each property drives the real ledger through arbitrary deposit/commit
// sequences and checks conservation of value across the settlement paths.

#[cfg(test)]
mod pool_properties {
    use investment_pool::eto::EtoPhase;
    use investment_pool::ledger::{self, ContributorRecord, PoolTotals, Settlement};
    use investment_pool::{PoolError, BPS_DENOMINATOR, MAX_COMMISSION_BPS};
    use proptest::prelude::*;

    const CONTRIBUTORS: usize = 5;

    /// (contributor index, amount, commit right after this deposit)
    fn deposit_script() -> impl Strategy<Value = Vec<(usize, u64, bool)>> {
        prop::collection::vec((0..CONTRIBUTORS, 1u64..=10_000_000_000u64, any::<bool>()), 1..40)
    }

    fn run_script(script: &[(usize, u64, bool)]) -> (PoolTotals, Vec<ContributorRecord>, Vec<u64>) {
        let mut totals = PoolTotals::default();
        let mut records = vec![ContributorRecord::default(); CONTRIBUTORS];
        let mut deposited = vec![0u64; CONTRIBUTORS];

        for &(who, amount, commit) in script {
            totals.record_contribution(&mut records[who], amount).unwrap();
            deposited[who] += amount;
            if commit {
                totals.mark_committed(totals.uncommitted()).unwrap();
            }
        }
        (totals, records, deposited)
    }

    // ========================================================================
    // Ledger conservation
    //
    // total_received is the sum of all deposits, each record holds the sum of
    // its own deposits, and the per-contributor committed/uncommitted split
    // adds up to the pool totals whatever the batch boundaries were.
    // ========================================================================
    proptest! {
        #[test]
        fn prop_ledger_conservation(script in deposit_script()) {
            let (totals, records, deposited) = run_script(&script);

            let received: u64 = script.iter().map(|&(_, amount, _)| amount).sum();
            prop_assert_eq!(totals.total_received, received);
            prop_assert_eq!(totals.total_received, totals.total_committed + totals.uncommitted());

            for (record, expected) in records.iter().zip(deposited.iter()) {
                prop_assert_eq!(record.contributed_total, *expected);
                prop_assert_eq!(record.committed(&totals) + record.uncommitted(&totals), *expected);
            }

            let committed: u64 = records.iter().map(|record| record.committed(&totals)).sum();
            let uncommitted: u64 = records.iter().map(|record| record.uncommitted(&totals)).sum();
            prop_assert_eq!(committed, totals.total_committed);
            prop_assert_eq!(uncommitted, totals.uncommitted());
        }

        #[test]
        fn prop_commit_forwards_exactly_uncommitted(script in deposit_script()) {
            let (mut totals, _, _) = run_script(&script);
            let before = totals;
            let pending = totals.uncommitted();

            let batch = totals.mark_committed(pending).unwrap();

            prop_assert_eq!(totals.total_committed, before.total_committed + pending);
            prop_assert_eq!(totals.total_received, totals.total_committed);
            if pending == 0 {
                prop_assert_eq!(batch, None);
                prop_assert_eq!(totals, before);
            } else {
                prop_assert_eq!(batch, Some(before.batch_count + 1));
            }
        }
    }

    // ========================================================================
    // Reward distribution
    //
    // Shares are floor-proportional to the committed portion, contributor
    // shares plus commission never exceed the snapshot, the residue left after
    // everyone claims is less than one unit per claimant, and a simulated
    // vault never goes negative (the last claimant is never starved).
    // ========================================================================
    proptest! {
        #[test]
        fn prop_rewards_are_proportional_and_conserved(
            script in deposit_script(),
            equity_balance in 0u64..=1_000_000_000_000_000u64,
            bonus_balance in 0u64..=1_000_000_000_000_000u64,
            commission_bps in 0u64..=MAX_COMMISSION_BPS,
        ) {
            let (mut totals, mut records, _) = run_script(&script);
            let mut settlement = Settlement::default();
            settlement.open_rewards(EtoPhase::Claim, equity_balance, bonus_balance, commission_bps).unwrap();

            let distributable = settlement.distributable_equity();
            let mut equity_vault = equity_balance;
            let mut bonus_vault = bonus_balance;
            let mut equity_paid = 0u64;
            let mut residue_paid = 0u64;
            let expected_residue = totals.uncommitted();

            for record in records.iter_mut() {
                let committed = record.committed(&totals) as u128;
                let share = settlement.claim_rewards(EtoPhase::Claim, record, &mut totals).unwrap();

                if totals.total_committed > 0 {
                    let total = totals.total_committed as u128;
                    let exact = distributable as u128 * committed;
                    prop_assert!(share.equity as u128 * total <= exact);
                    prop_assert!(exact < (share.equity as u128 + 1) * total);
                }

                prop_assert!(share.equity <= equity_vault, "equity vault starved");
                prop_assert!(share.bonus <= bonus_vault, "bonus vault starved");
                equity_vault -= share.equity;
                bonus_vault -= share.bonus;
                equity_paid += share.equity;
                residue_paid += share.residue;
            }

            let (equity_commission, bonus_commission) = settlement.claim_commission(EtoPhase::Claim).unwrap();
            prop_assert!(equity_commission <= equity_vault);
            prop_assert!(bonus_commission <= bonus_vault);
            prop_assert!(equity_paid + equity_commission <= equity_balance);
            prop_assert_eq!(residue_paid, expected_residue);

            if totals.total_committed > 0 {
                prop_assert!(distributable - equity_paid < CONTRIBUTORS as u64, "dust above bound");
            }
        }

        #[test]
        fn prop_commission_within_bounds(
            balance in 0u64..=u64::MAX,
            commission_bps in 0u64..=MAX_COMMISSION_BPS,
        ) {
            let commission = ledger::pro_rata(balance, commission_bps, BPS_DENOMINATOR).unwrap();
            prop_assert!(commission <= balance);
            prop_assert!(commission as u128 * BPS_DENOMINATOR as u128 <= balance as u128 * commission_bps as u128);
        }
    }

    // ========================================================================
    // Refunds and double claims
    //
    // On a failed offering every contributor gets back exactly what they put
    // in, and no record can ever be paid twice in either form.
    // ========================================================================
    proptest! {
        #[test]
        fn prop_refund_returns_every_contribution(script in deposit_script()) {
            let (mut totals, mut records, deposited) = run_script(&script);
            let mut settlement = Settlement::default();
            settlement.open_refunds(EtoPhase::Refund).unwrap();

            for (record, expected) in records.iter_mut().zip(deposited.iter()) {
                let refund = settlement.claim_refund(EtoPhase::Refund, record, &mut totals).unwrap();
                prop_assert_eq!(refund, *expected);
            }
            prop_assert_eq!(totals.total_paid_out, totals.total_received);
        }

        #[test]
        fn prop_no_record_paid_twice(script in deposit_script(), rewards_first in any::<bool>()) {
            let (mut totals, mut records, _) = run_script(&script);
            let mut settlement = Settlement::default();
            settlement.open_rewards(EtoPhase::Claim, 1_000_000, 1_000_000, 0).unwrap();
            settlement.refund_pulled = true;

            for record in records.iter_mut() {
                if rewards_first {
                    settlement.claim_rewards(EtoPhase::Claim, record, &mut totals).unwrap();
                } else {
                    settlement.claim_refund(EtoPhase::Refund, record, &mut totals).unwrap();
                }

                let again_rewards = settlement.claim_rewards(EtoPhase::Claim, record, &mut totals);
                let again_refund = settlement.claim_refund(EtoPhase::Refund, record, &mut totals);
                prop_assert!(matches!(again_rewards, Err(PoolError::AlreadyClaimed)));
                prop_assert!(matches!(again_refund, Err(PoolError::AlreadyClaimed)));
                prop_assert!(!(record.rewards_claimed && record.refund_claimed));
            }
        }
    }
}
