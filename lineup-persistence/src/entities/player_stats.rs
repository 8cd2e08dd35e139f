use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "player_stats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub member_id: String,
    pub games_played: i32,
    pub wins: i32,
    pub losses: i32,
    pub best_turns: Option<i32>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roster_members::Entity",
        from = "Column::MemberId",
        to = "super::roster_members::Column::Id"
    )]
    RosterMember,
}

impl Related<super::roster_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RosterMember.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
