use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PlayerStats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlayerStats::MemberId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PlayerStats::GamesPlayed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PlayerStats::Wins)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PlayerStats::Losses)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(PlayerStats::BestTurns).integer())
                    .col(
                        ColumnDef::new(PlayerStats::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_player_stats_member_id")
                            .from(PlayerStats::Table, PlayerStats::MemberId)
                            .to(RosterMembers::Table, RosterMembers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // League table queries sort on wins
        manager
            .create_index(
                Index::create()
                    .name("idx_player_stats_wins")
                    .table(PlayerStats::Table)
                    .col(PlayerStats::Wins)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PlayerStats::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PlayerStats {
    Table,
    MemberId,
    GamesPlayed,
    Wins,
    Losses,
    BestTurns,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RosterMembers {
    Table,
    Id,
}
