use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "roster_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub nickname: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::player_stats::Entity")]
    PlayerStats,
}

impl Related<super::player_stats::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlayerStats.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
