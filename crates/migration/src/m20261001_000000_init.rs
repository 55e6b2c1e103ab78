//! Initial schema.
//!
//! - `users`: Telegram accounts seen by the bot
//! - `groups`: Telegram group chats, each with its own currency
//! - `group_members`: who takes part in a group's expenses
//! - `templates` / `template_participants`: saved expense definitions
//! - `expenses` / `splits`: recorded expenses and their per-user shares
//! - `settlements`: payments between members that reduce balances

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    UsernameNorm,
    DisplayName,
    CreatedAt,
}

#[derive(Iden)]
enum Groups {
    Table,
    Id,
    Title,
    Currency,
    CreatedAt,
}

#[derive(Iden)]
enum GroupMembers {
    Table,
    GroupId,
    UserId,
    JoinedAt,
}

#[derive(Iden)]
enum Templates {
    Table,
    Id,
    OwnerId,
    GroupId,
    Name,
    NameNorm,
    AmountMinor,
    Category,
    CreatedAt,
}

#[derive(Iden)]
enum TemplateParticipants {
    Table,
    TemplateId,
    UserId,
    Position,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    GroupId,
    PayerId,
    AmountMinor,
    Currency,
    Description,
    Category,
    TemplateId,
    OccurredAt,
    CreatedAt,
    VoidedAt,
    IdempotencyKey,
}

#[derive(Iden)]
enum Splits {
    Table,
    Id,
    ExpenseId,
    UserId,
    AmountMinor,
}

#[derive(Iden)]
enum Settlements {
    Table,
    Id,
    GroupId,
    FromUserId,
    ToUserId,
    AmountMinor,
    Currency,
    Note,
    OccurredAt,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // Users and groups
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Username).string())
                    .col(ColumnDef::new(Users::UsernameNorm).string())
                    .col(ColumnDef::new(Users::DisplayName).string().not_null())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-username_norm")
                    .table(Users::Table)
                    .col(Users::UsernameNorm)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Groups::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Groups::Title).string().not_null())
                    .col(
                        ColumnDef::new(Groups::Currency)
                            .string()
                            .not_null()
                            .default("EUR"),
                    )
                    .col(ColumnDef::new(Groups::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupMembers::GroupId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GroupMembers::UserId).big_integer().not_null())
                    .col(ColumnDef::new(GroupMembers::JoinedAt).timestamp().not_null())
                    .primary_key(
                        Index::create()
                            .col(GroupMembers::GroupId)
                            .col(GroupMembers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_members-group_id")
                            .from(GroupMembers::Table, GroupMembers::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_members-user_id")
                            .from(GroupMembers::Table, GroupMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // Templates
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Templates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Templates::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Templates::OwnerId).big_integer().not_null())
                    .col(ColumnDef::new(Templates::GroupId).big_integer())
                    .col(ColumnDef::new(Templates::Name).string().not_null())
                    .col(ColumnDef::new(Templates::NameNorm).string().not_null())
                    .col(
                        ColumnDef::new(Templates::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Templates::Category).string())
                    .col(ColumnDef::new(Templates::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-templates-owner_id")
                            .from(Templates::Table, Templates::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-templates-group_id")
                            .from(Templates::Table, Templates::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // SQLite treats NULLs as distinct, so personal templates (NULL group)
        // are kept unique by the engine.
        manager
            .create_index(
                Index::create()
                    .name("idx-templates-owner-group-name-unique")
                    .table(Templates::Table)
                    .col(Templates::OwnerId)
                    .col(Templates::GroupId)
                    .col(Templates::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TemplateParticipants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TemplateParticipants::TemplateId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TemplateParticipants::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TemplateParticipants::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(TemplateParticipants::TemplateId)
                            .col(TemplateParticipants::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-template_participants-template_id")
                            .from(TemplateParticipants::Table, TemplateParticipants::TemplateId)
                            .to(Templates::Table, Templates::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-template_participants-user_id")
                            .from(TemplateParticipants::Table, TemplateParticipants::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // Expenses and splits
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::GroupId).big_integer())
                    .col(ColumnDef::new(Expenses::PayerId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Expenses::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::Currency).string().not_null())
                    .col(ColumnDef::new(Expenses::Description).string().not_null())
                    .col(ColumnDef::new(Expenses::Category).string())
                    .col(ColumnDef::new(Expenses::TemplateId).uuid())
                    .col(ColumnDef::new(Expenses::OccurredAt).timestamp().not_null())
                    .col(ColumnDef::new(Expenses::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Expenses::VoidedAt).timestamp())
                    .col(ColumnDef::new(Expenses::IdempotencyKey).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-group_id")
                            .from(Expenses::Table, Expenses::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-payer_id")
                            .from(Expenses::Table, Expenses::PayerId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-template_id")
                            .from(Expenses::Table, Expenses::TemplateId)
                            .to(Templates::Table, Templates::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-group_id-occurred_at")
                    .table(Expenses::Table)
                    .col(Expenses::GroupId)
                    .col(Expenses::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-payer_id")
                    .table(Expenses::Table)
                    .col(Expenses::PayerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-idempotency_key")
                    .table(Expenses::Table)
                    .col(Expenses::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Splits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Splits::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Splits::ExpenseId).uuid().not_null())
                    .col(ColumnDef::new(Splits::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Splits::AmountMinor).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-splits-expense_id")
                            .from(Splits::Table, Splits::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-splits-user_id")
                            .from(Splits::Table, Splits::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-splits-expense_id")
                    .table(Splits::Table)
                    .col(Splits::ExpenseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-splits-user_id")
                    .table(Splits::Table)
                    .col(Splits::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // Settlements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Settlements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Settlements::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Settlements::GroupId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Settlements::FromUserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Settlements::ToUserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Settlements::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Settlements::Currency).string().not_null())
                    .col(ColumnDef::new(Settlements::Note).string())
                    .col(
                        ColumnDef::new(Settlements::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Settlements::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlements-group_id")
                            .from(Settlements::Table, Settlements::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlements-from_user_id")
                            .from(Settlements::Table, Settlements::FromUserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlements-to_user_id")
                            .from(Settlements::Table, Settlements::ToUserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-settlements-group_id-occurred_at")
                    .table(Settlements::Table)
                    .col(Settlements::GroupId)
                    .col(Settlements::OccurredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Children first so foreign keys never dangle.
        manager
            .drop_table(Table::drop().table(Settlements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Splits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TemplateParticipants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Templates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
