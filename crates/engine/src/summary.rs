//! Monthly summary report types.

use crate::{Currency, MonthPeriod, Scope, User};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserAmount {
    pub user: User,
    pub amount_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryAmount {
    /// `None` groups uncategorized expenses.
    pub category: Option<String>,
    pub amount_minor: i64,
    pub count: u64,
}

/// Aggregates for one calendar month.
///
/// For a group: `by_payer` is who paid, `by_share` is who consumed. For a
/// personal summary both are empty and `group_shares` holds the user's share
/// of group expenses, one entry per currency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthlySummary {
    pub scope: Scope,
    pub period: MonthPeriod,
    pub currency: Currency,
    pub expense_count: u64,
    pub total_minor: i64,
    pub by_payer: Vec<UserAmount>,
    pub by_share: Vec<UserAmount>,
    pub by_category: Vec<CategoryAmount>,
    pub settlements_count: u64,
    pub settlements_total_minor: i64,
    pub group_shares: Vec<(Currency, i64)>,
}

impl MonthlySummary {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expense_count == 0 && self.settlements_count == 0 && self.group_shares.is_empty()
    }

    /// Average expense, rounded toward zero.
    #[must_use]
    pub fn average_minor(&self) -> Option<i64> {
        let count = i64::try_from(self.expense_count).ok()?;
        (count > 0).then(|| self.total_minor / count)
    }
}

/// Sort rows by amount (descending), then by a stable name.
pub(crate) fn sort_user_amounts(rows: &mut [UserAmount]) {
    rows.sort_by(|a, b| {
        b.amount_minor
            .cmp(&a.amount_minor)
            .then_with(|| a.user.display_name.cmp(&b.user.display_name))
            .then(a.user.id.cmp(&b.user.id))
    });
}

pub(crate) fn sort_category_amounts(rows: &mut [CategoryAmount]) {
    rows.sort_by(|a, b| {
        b.amount_minor
            .cmp(&a.amount_minor)
            .then_with(|| a.category.cmp(&b.category))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, name: &str) -> User {
        User {
            id,
            username: None,
            display_name: name.to_string(),
        }
    }

    #[test]
    fn user_rows_sort_by_amount_then_name() {
        let mut rows = vec![
            UserAmount {
                user: user(1, "Bruno"),
                amount_minor: 100,
            },
            UserAmount {
                user: user(2, "Anna"),
                amount_minor: 100,
            },
            UserAmount {
                user: user(3, "Carla"),
                amount_minor: 500,
            },
        ];
        sort_user_amounts(&mut rows);
        let names: Vec<_> = rows.iter().map(|r| r.user.display_name.as_str()).collect();
        assert_eq!(names, ["Carla", "Anna", "Bruno"]);
    }

    #[test]
    fn average_is_none_without_expenses() {
        let summary = MonthlySummary {
            scope: Scope::Personal,
            period: MonthPeriod::new(2026, 10).unwrap(),
            currency: Currency::Eur,
            expense_count: 0,
            total_minor: 0,
            by_payer: Vec::new(),
            by_share: Vec::new(),
            by_category: Vec::new(),
            settlements_count: 0,
            settlements_total_minor: 0,
            group_shares: Vec::new(),
        };
        assert!(summary.is_empty());
        assert_eq!(summary.average_minor(), None);
    }
}
