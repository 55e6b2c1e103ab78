//! Net balances inside a group and the transfers that settle them.

/// Net position of a group member, in minor units.
///
/// Positive: the group owes the user. Negative: the user owes the group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Balance {
    pub user_id: i64,
    pub net_minor: i64,
}

/// A payment that would move `amount_minor` from a debtor to a creditor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub amount_minor: i64,
}

/// Greedy settle-up plan: the largest debtor pays the largest creditor until
/// every net is zero.
///
/// Produces at most `n - 1` transfers for `n` non-zero balances. Balances that
/// do not sum to zero are settled as far as possible; the leftover is ignored.
#[must_use]
pub fn suggest_transfers(balances: &[Balance]) -> Vec<Transfer> {
    let mut creditors: Vec<(i64, i64)> = balances
        .iter()
        .filter(|b| b.net_minor > 0)
        .map(|b| (b.user_id, b.net_minor))
        .collect();
    let mut debtors: Vec<(i64, i64)> = balances
        .iter()
        .filter(|b| b.net_minor < 0)
        .map(|b| (b.user_id, -b.net_minor))
        .collect();

    // Largest first; ties broken by user id so the plan is deterministic.
    creditors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    debtors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut transfers = Vec::new();
    let (mut ci, mut di) = (0, 0);
    while ci < creditors.len() && di < debtors.len() {
        let amount = creditors[ci].1.min(debtors[di].1);
        transfers.push(Transfer {
            from_user_id: debtors[di].0,
            to_user_id: creditors[ci].0,
            amount_minor: amount,
        });
        creditors[ci].1 -= amount;
        debtors[di].1 -= amount;
        if creditors[ci].1 == 0 {
            ci += 1;
        }
        if debtors[di].1 == 0 {
            di += 1;
        }
    }
    transfers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(user_id: i64, net_minor: i64) -> Balance {
        Balance { user_id, net_minor }
    }

    #[test]
    fn single_debtor_pays_single_creditor() {
        let plan = suggest_transfers(&[b(1, 1500), b(2, -1500)]);
        assert_eq!(
            plan,
            vec![Transfer {
                from_user_id: 2,
                to_user_id: 1,
                amount_minor: 1500
            }]
        );
    }

    #[test]
    fn three_way_settles_with_two_transfers() {
        // Alice paid 30 split across three: she is owed 20, the others owe 10.
        let plan = suggest_transfers(&[b(1, 2000), b(2, -1000), b(3, -1000)]);
        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|t| t.to_user_id == 1 && t.amount_minor == 1000));
    }

    #[test]
    fn settled_group_needs_no_transfers() {
        assert!(suggest_transfers(&[b(1, 0), b(2, 0)]).is_empty());
    }

    #[test]
    fn plan_zeroes_every_balance() {
        let balances = [b(1, 700), b(2, 300), b(3, -450), b(4, -550)];
        let plan = suggest_transfers(&balances);
        assert!(plan.len() <= 3);
        for balance in balances {
            let received: i64 = plan
                .iter()
                .filter(|t| t.to_user_id == balance.user_id)
                .map(|t| t.amount_minor)
                .sum();
            let sent: i64 = plan
                .iter()
                .filter(|t| t.from_user_id == balance.user_id)
                .map(|t| t.amount_minor)
                .sum();
            assert_eq!(balance.net_minor - received + sent, 0);
        }
    }
}
