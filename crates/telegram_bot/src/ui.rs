use engine::{
    Balance, Currency, Expense, Money, MonthlySummary, Settlement, Template, Transfer, User,
    UserAmount,
};
use teloxide::{
    types::{InlineKeyboardButton, InlineKeyboardMarkup},
    utils::{command::BotCommands, html},
};

use crate::commands::Command;

const BUTTON_LABEL_CHARS: usize = 24;
/// Two buttons per template row keeps the keyboard far below Telegram's cap.
const TEMPLATE_ROWS: usize = 20;
const SUMMARY_ROWS: usize = 10;

pub(crate) fn welcome_text(name: &str) -> String {
    format!(
        "Hi {}! I keep track of who paid what.\n\n{}",
        html::escape(name),
        help_text()
    )
}

pub(crate) fn help_text() -> String {
    format!(
        "{}\n\nExamples:\n/expense 30 #food pizza @bob @carol\n/template create \"Pizza night\" 45 #food\n/template use \"Pizza night\" 25\n/summary 2026-10\n/settle @alice 12.50 cash",
        html::escape(&Command::descriptions().to_string())
    )
}

pub(crate) fn template_usage() -> &'static str {
    "Usage:\n/template create \"name\" amount [#category] [@user ...]\n/template list\n/template use \"name\" [amount] [description]\n/template delete \"name\""
}

pub(crate) fn render_expense(expense: &Expense, users: &[User]) -> (String, InlineKeyboardMarkup) {
    let currency = expense.currency;
    let mut text = format!(
        "💸 <b>{}</b> • {}\nPaid by {}{}",
        html::escape(&expense.description),
        amount(expense.amount_minor, currency),
        name_of(users, expense.payer_id),
        category_suffix(expense.category.as_deref()),
    );

    if expense.scope.is_group() {
        let shares = expense
            .splits
            .iter()
            .map(|s| format!("{} {}", name_of(users, s.user_id), amount(s.amount_minor, currency)))
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(&format!("\nSplit: {shares}"));
    }

    let kb = if expense.is_voided() {
        InlineKeyboardMarkup::default()
    } else {
        InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
            "↩️ Undo",
            format!("exp:void:{id}", id = expense.id),
        )]])
    };
    (text, kb)
}

pub(crate) fn render_voided(expense: &Expense) -> String {
    format!(
        "↩️ Undone: <s>{}</s> • {}",
        html::escape(&expense.description),
        amount(expense.amount_minor, expense.currency)
    )
}

/// Latest expenses; only the viewer's own expenses get an undo button.
pub(crate) fn render_history(
    expenses: &[Expense],
    users: &[User],
    viewer_id: i64,
) -> (String, InlineKeyboardMarkup) {
    if expenses.is_empty() {
        return (
            "No expenses yet. Add one with /expense.".to_string(),
            InlineKeyboardMarkup::default(),
        );
    }

    let mut text = String::from("🧾 <b>Latest expenses</b>\n");
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for (idx, expense) in expenses.iter().enumerate() {
        text.push_str(&format!(
            "\n{}. {} • {} • {}{} ({})",
            idx + 1,
            expense.occurred_at.date_naive(),
            amount(expense.amount_minor, expense.currency),
            html::escape(&expense.description),
            category_suffix(expense.category.as_deref()),
            name_of(users, expense.payer_id),
        ));
        if expense.payer_id == viewer_id {
            rows.push(vec![InlineKeyboardButton::callback(
                format!("↩️ Undo {}. {}", idx + 1, truncate(&expense.description)),
                format!("exp:void:{id}", id = expense.id),
            )]);
        }
    }
    (text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn render_templates(
    templates: &[Template],
    currency: Currency,
) -> (String, InlineKeyboardMarkup) {
    if templates.is_empty() {
        return (
            "No templates yet. Create one with:\n/template create \"name\" amount".to_string(),
            InlineKeyboardMarkup::default(),
        );
    }

    let mut text = String::from("📋 <b>Templates</b>\n");
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for template in templates.iter().take(TEMPLATE_ROWS) {
        text.push_str(&format!(
            "\n• <b>{}</b> • {}{}{}",
            html::escape(&template.name),
            amount(template.amount_minor, currency),
            category_suffix(template.category.as_deref()),
            participants_suffix(template.participants.len()),
        ));
        rows.push(vec![
            InlineKeyboardButton::callback(
                format!("▶️ {}", truncate(&template.name)),
                format!("tpl:use:{id}", id = template.id),
            ),
            InlineKeyboardButton::callback("🗑", format!("tpl:del:{id}", id = template.id)),
        ]);
    }
    push_more(&mut text, templates.len(), TEMPLATE_ROWS);
    (text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn render_template_saved(
    template: &Template,
    users: &[User],
    currency: Currency,
) -> (String, InlineKeyboardMarkup) {
    let mut text = format!(
        "✅ Template <b>{}</b> saved: {}{}",
        html::escape(&template.name),
        amount(template.amount_minor, currency),
        category_suffix(template.category.as_deref()),
    );
    if !template.participants.is_empty() {
        let names = template
            .participants
            .iter()
            .map(|id| name_of(users, *id))
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(&format!("\nShared with: {names}"));
    }

    let kb = InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("▶️ Use now", format!("tpl:use:{id}", id = template.id)),
            InlineKeyboardButton::callback("🗑 Delete", format!("tpl:del:{id}", id = template.id)),
        ],
        vec![InlineKeyboardButton::callback("📋 All templates", "nav:templates")],
    ]);
    (text, kb)
}

pub(crate) fn render_template_deleted(template: &Template) -> String {
    format!("🗑 Template <b>{}</b> deleted.", html::escape(&template.name))
}

pub(crate) fn render_summary(summary: &MonthlySummary) -> (String, InlineKeyboardMarkup) {
    let currency = summary.currency;
    let mut text = format!("📊 <b>{}</b>", summary.period.label());

    if summary.is_empty() {
        text.push_str("\n\nNo expenses this month.");
    } else {
        text.push_str(&format!(
            "\n\nExpenses: {} • Total: {}",
            summary.expense_count,
            amount(summary.total_minor, currency)
        ));
        if let Some(average) = summary.average_minor() {
            text.push_str(&format!(" • Average: {}", amount(average, currency)));
        }

        push_user_rows(&mut text, "Paid", &summary.by_payer, currency);
        push_user_rows(&mut text, "Shares", &summary.by_share, currency);

        if !summary.by_category.is_empty() {
            text.push_str("\n\n<b>Categories</b>");
            for row in summary.by_category.iter().take(SUMMARY_ROWS) {
                let label = row
                    .category
                    .as_deref()
                    .map_or_else(
                        || "uncategorized".to_string(),
                        |c| format!("#{}", html::escape(&truncate(c))),
                    );
                text.push_str(&format!(
                    "\n{label}: {} ({})",
                    amount(row.amount_minor, currency),
                    row.count
                ));
            }
            push_more(&mut text, summary.by_category.len(), SUMMARY_ROWS);
        }

        if summary.settlements_count > 0 {
            text.push_str(&format!(
                "\n\nSettlements: {} • {}",
                summary.settlements_count,
                amount(summary.settlements_total_minor, currency)
            ));
        }

        if !summary.group_shares.is_empty() {
            text.push_str("\n\n<b>Your share of group expenses</b>");
            for (share_currency, share) in &summary.group_shares {
                text.push_str(&format!("\n{}", amount(*share, *share_currency)));
            }
        }
    }

    let prev = summary.period.prev();
    let next = summary.period.next();
    let kb = InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(format!("◀️ {}", prev.label()), format!("sum:{prev}")),
        InlineKeyboardButton::callback(format!("{} ▶️", next.label()), format!("sum:{next}")),
    ]]);
    (text, kb)
}

pub(crate) fn render_balances(
    balances: &[Balance],
    transfers: &[Transfer],
    users: &[User],
    currency: Currency,
) -> String {
    if balances.iter().all(|b| b.net_minor == 0) {
        return "⚖️ Everyone is settled up.".to_string();
    }

    let mut text = String::from("⚖️ <b>Balances</b>\n");
    for balance in balances {
        let sign = if balance.net_minor > 0 { "+" } else { "" };
        text.push_str(&format!(
            "\n{}: {sign}{}",
            name_of(users, balance.user_id),
            amount(balance.net_minor, currency)
        ));
    }

    if !transfers.is_empty() {
        text.push_str("\n\n<b>Suggested payments</b>");
        for transfer in transfers {
            text.push_str(&format!(
                "\n{} → {}: {}",
                name_of(users, transfer.from_user_id),
                name_of(users, transfer.to_user_id),
                amount(transfer.amount_minor, currency)
            ));
        }
    }
    text
}

pub(crate) fn render_settlement(settlement: &Settlement, users: &[User]) -> String {
    let note = settlement
        .note
        .as_deref()
        .map(|n| format!(" • {}", html::escape(n)))
        .unwrap_or_default();
    format!(
        "🤝 {} paid {} {}{note}",
        name_of(users, settlement.from_user_id),
        name_of(users, settlement.to_user_id),
        amount(settlement.amount_minor, settlement.currency)
    )
}

fn push_user_rows(text: &mut String, title: &str, rows: &[UserAmount], currency: Currency) {
    if rows.is_empty() {
        return;
    }
    text.push_str(&format!("\n\n<b>{title}</b>"));
    for row in rows.iter().take(SUMMARY_ROWS) {
        text.push_str(&format!(
            "\n{}: {}",
            html::escape(&row.user.mention()),
            amount(row.amount_minor, currency)
        ));
    }
    push_more(text, rows.len(), SUMMARY_ROWS);
}

fn push_more(text: &mut String, total: usize, shown: usize) {
    if total > shown {
        text.push_str(&format!("\n…and {} more", total - shown));
    }
}

fn name_of(users: &[User], user_id: i64) -> String {
    let name = users
        .iter()
        .find(|u| u.id == user_id)
        .map_or_else(|| format!("user {user_id}"), User::mention);
    html::escape(&name)
}

fn amount(minor: i64, currency: Currency) -> String {
    Money::new(minor).format(currency)
}

fn category_suffix(category: Option<&str>) -> String {
    category
        .map(|c| format!(" • #{}", html::escape(&truncate(c))))
        .unwrap_or_default()
}

fn participants_suffix(count: usize) -> String {
    match count {
        0 => String::new(),
        1 => " • 1 person".to_string(),
        n => format!(" • {n} people"),
    }
}

/// Button labels and free-form tags stay short; Telegram truncates long
/// labels badly.
fn truncate(label: &str) -> String {
    if label.chars().count() <= BUTTON_LABEL_CHARS {
        return label.to_string();
    }
    let mut out: String = label.chars().take(BUTTON_LABEL_CHARS - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use engine::{CategoryAmount, MonthPeriod, Scope, Split};
    use teloxide::types::InlineKeyboardButtonKind;
    use uuid::Uuid;

    use super::*;

    fn user(id: i64, username: Option<&str>, display_name: &str) -> User {
        User {
            id,
            username: username.map(str::to_string),
            display_name: display_name.to_string(),
        }
    }

    fn callback_data(kb: &InlineKeyboardMarkup) -> Vec<String> {
        kb.inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    fn dinner() -> Expense {
        Expense {
            id: Uuid::new_v4(),
            scope: Scope::Group(-1),
            payer_id: 1,
            amount_minor: 3000,
            currency: Currency::Eur,
            description: "Fish & chips".to_string(),
            category: Some("food".to_string()),
            template_id: None,
            occurred_at: Utc.with_ymd_and_hms(2026, 10, 3, 20, 0, 0).unwrap(),
            voided_at: None,
            splits: vec![
                Split {
                    user_id: 1,
                    amount_minor: 1000,
                },
                Split {
                    user_id: 2,
                    amount_minor: 1000,
                },
                Split {
                    user_id: 3,
                    amount_minor: 1000,
                },
            ],
        }
    }

    #[test]
    fn expense_lists_shares_and_offers_undo() {
        let users = [
            user(1, Some("alice"), "Alice"),
            user(2, None, "Bob <b>"),
            user(3, Some("carol"), "Carol"),
        ];
        let expense = dinner();
        let (text, kb) = render_expense(&expense, &users);

        assert!(text.contains("<b>Fish &amp; chips</b> • 30.00 €"));
        assert!(text.contains("Paid by @alice • #food"));
        assert!(text.contains("@alice 10.00 €, Bob &lt;b&gt; 10.00 €, @carol 10.00 €"));
        assert_eq!(callback_data(&kb), [format!("exp:void:{}", expense.id)]);
    }

    #[test]
    fn voided_expense_has_no_buttons() {
        let mut expense = dinner();
        expense.voided_at = Some(Utc::now());
        let (_, kb) = render_expense(&expense, &[]);
        assert!(callback_data(&kb).is_empty());
        assert!(render_voided(&expense).contains("<s>Fish &amp; chips</s>"));
    }

    #[test]
    fn history_offers_undo_only_to_the_payer() {
        let mine = dinner();
        let mut theirs = dinner();
        theirs.payer_id = 2;
        let (text, kb) = render_history(&[mine.clone(), theirs], &[], 1);

        assert!(text.contains("1. 2026-10-03 • 30.00 €"));
        assert!(text.contains("(user 2)"));
        assert_eq!(callback_data(&kb), [format!("exp:void:{}", mine.id)]);
    }

    #[test]
    fn templates_have_use_and_delete_buttons() {
        let template = Template {
            id: Uuid::new_v4(),
            owner_id: 1,
            scope: Scope::Personal,
            name: "A very long template name that keeps going".to_string(),
            amount_minor: 4500,
            category: None,
            participants: vec![1, 2],
        };
        let (text, kb) = render_templates(std::slice::from_ref(&template), Currency::Eur);

        assert!(text.contains("45.00 € • 2 people"));
        assert_eq!(
            callback_data(&kb),
            [
                format!("tpl:use:{}", template.id),
                format!("tpl:del:{}", template.id)
            ]
        );
        let label = &kb.inline_keyboard[0][0].text;
        assert!(label.ends_with('…'));
        assert!(label.chars().count() <= BUTTON_LABEL_CHARS + 3);
    }

    #[test]
    fn long_template_lists_are_capped() {
        let templates: Vec<Template> = (0..120)
            .map(|n| Template {
                id: Uuid::new_v4(),
                owner_id: 1,
                scope: Scope::Personal,
                name: format!("{n:03} {}", "x".repeat(60)),
                amount_minor: 1000,
                category: Some("c".repeat(200)),
                participants: Vec::new(),
            })
            .collect();
        let (text, kb) = render_templates(&templates, Currency::Eur);

        assert!(text.chars().count() < 4096);
        assert_eq!(kb.inline_keyboard.len(), TEMPLATE_ROWS);
        assert!(kb.inline_keyboard.iter().flatten().count() <= 100);
        assert!(text.ends_with("\n…and 100 more"));
        assert!(!text.contains("020 xxx"));
    }

    #[test]
    fn summary_categories_are_capped() {
        let summary = MonthlySummary {
            scope: Scope::Personal,
            period: MonthPeriod::new(2026, 3).unwrap(),
            currency: Currency::Eur,
            expense_count: 15,
            total_minor: 1500,
            by_payer: Vec::new(),
            by_share: Vec::new(),
            by_category: (0..15)
                .map(|n| CategoryAmount {
                    category: Some(format!("tag{n}")),
                    amount_minor: 100,
                    count: 1,
                })
                .collect(),
            settlements_count: 0,
            settlements_total_minor: 0,
            group_shares: Vec::new(),
        };
        let (text, _) = render_summary(&summary);

        assert!(text.contains("#tag9: 1.00 €"));
        assert!(!text.contains("#tag10"));
        assert!(text.ends_with("\n…and 5 more"));
    }

    #[test]
    fn summary_navigates_between_months() {
        let summary = MonthlySummary {
            scope: Scope::Group(-1),
            period: MonthPeriod::new(2026, 1).unwrap(),
            currency: Currency::Eur,
            expense_count: 2,
            total_minor: 5000,
            by_payer: vec![UserAmount {
                user: user(1, Some("alice"), "Alice"),
                amount_minor: 5000,
            }],
            by_share: Vec::new(),
            by_category: vec![CategoryAmount {
                category: None,
                amount_minor: 5000,
                count: 2,
            }],
            settlements_count: 0,
            settlements_total_minor: 0,
            group_shares: Vec::new(),
        };
        let (text, kb) = render_summary(&summary);

        assert!(text.starts_with("📊 <b>January 2026</b>"));
        assert!(text.contains("Expenses: 2 • Total: 50.00 € • Average: 25.00 €"));
        assert!(text.contains("@alice: 50.00 €"));
        assert!(text.contains("uncategorized: 50.00 € (2)"));
        assert_eq!(callback_data(&kb), ["sum:2025-12", "sum:2026-02"]);
    }

    #[test]
    fn balances_show_signs_and_payments() {
        let users = [user(1, Some("alice"), "Alice"), user(2, Some("bob"), "Bob")];
        let balances = [
            Balance {
                user_id: 1,
                net_minor: 1500,
            },
            Balance {
                user_id: 2,
                net_minor: -1500,
            },
        ];
        let transfers = engine::suggest_transfers(&balances);
        let text = render_balances(&balances, &transfers, &users, Currency::Eur);

        assert!(text.contains("@alice: +15.00 €"));
        assert!(text.contains("@bob: -15.00 €"));
        assert!(text.contains("@bob → @alice: 15.00 €"));

        let settled = [Balance {
            user_id: 1,
            net_minor: 0,
        }];
        assert_eq!(
            render_balances(&settled, &[], &users, Currency::Eur),
            "⚖️ Everyone is settled up."
        );
    }
}
