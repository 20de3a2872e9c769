use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Staff accounts. Roles are stored as a sorted CSV of role ids.
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(User::Email)
                            .string_len(256)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(User::Username).string_len(128).not_null())
                    .col(ColumnDef::new(User::Password).string().not_null())
                    .col(ColumnDef::new(User::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(User::Roles)
                            .string_len(64)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(User::ResourceId).integer().null())
                    .col(ColumnDef::new(User::AutobiographyId).integer().null())
                    .col(ColumnDef::new(User::CreatedOn).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_email")
                    .table(User::Table)
                    .col(User::Email)
                    .to_owned(),
            )
            .await?;

        // Append-only audit trail, one row per (user, version).
        manager
            .create_table(
                Table::create()
                    .table(UserHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserHistory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserHistory::UserId).integer().not_null())
                    .col(ColumnDef::new(UserHistory::Version).integer().not_null())
                    .col(ColumnDef::new(UserHistory::ChangedBy).integer().not_null())
                    .col(
                        ColumnDef::new(UserHistory::ChangedOn)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserHistory::Action).string_len(32).not_null())
                    .col(
                        ColumnDef::new(UserHistory::Username)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserHistory::Email)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserHistory::Roles)
                            .string_len(64)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(UserHistory::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_history_user_id")
                            .from(UserHistory::Table, UserHistory::UserId)
                            .to(User::Table, User::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_history_user_version")
                    .table(UserHistory::Table)
                    .col(UserHistory::UserId)
                    .col(UserHistory::Version)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Persisted role definitions. The administrator marker (id 0) is
        // intentionally never stored here.
        manager
            .create_table(
                Table::create()
                    .table(Role::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Role::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Role::Name).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Role::Privileges)
                            .string_len(64)
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
            )
            .await?;

        // One-time password reset codes.
        manager
            .create_table(
                Table::create()
                    .table(PasswordReset::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PasswordReset::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PasswordReset::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(PasswordReset::ResetCode)
                            .string_len(8)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(PasswordReset::CreatedOn)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_password_reset_user_id")
                            .from(PasswordReset::Table, PasswordReset::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_password_reset_user")
                    .table(PasswordReset::Table)
                    .col(PasswordReset::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PasswordReset::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Role::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserHistory::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Email,
    Username,
    Password,
    Status,
    Roles,
    ResourceId,
    AutobiographyId,
    CreatedOn,
}

#[derive(DeriveIden)]
enum UserHistory {
    Table,
    Id,
    UserId,
    Version,
    ChangedBy,
    ChangedOn,
    Action,
    Username,
    Email,
    Roles,
    Status,
}

#[derive(DeriveIden)]
enum Role {
    Table,
    Id,
    Name,
    Privileges,
}

#[derive(DeriveIden)]
enum PasswordReset {
    Table,
    Id,
    UserId,
    ResetCode,
    CreatedOn,
}
