use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RosterMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RosterMembers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RosterMembers::Name).string().not_null())
                    .col(ColumnDef::new(RosterMembers::Nickname).string())
                    .col(ColumnDef::new(RosterMembers::ImageUrl).string())
                    .col(
                        ColumnDef::new(RosterMembers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Roster listings are ordered by name
        manager
            .create_index(
                Index::create()
                    .name("idx_roster_members_name")
                    .table(RosterMembers::Table)
                    .col(RosterMembers::Name)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RosterMembers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RosterMembers {
    Table,
    Id,
    Name,
    Nickname,
    ImageUrl,
    CreatedAt,
}
