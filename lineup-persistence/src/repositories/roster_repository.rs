use anyhow::Result;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait, QueryOrder};
use uuid::Uuid;

use crate::entities::{prelude::*, roster_members};
use lineup_types::RosterMember;

#[derive(Clone)]
pub struct RosterRepository {
    db: DatabaseConnection,
}

impl RosterRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_member(model: roster_members::Model) -> Result<RosterMember> {
        Ok(RosterMember {
            id: Uuid::parse_str(&model.id)?,
            name: model.name,
            nickname: model.nickname,
            image_url: model.image_url,
            created_at: model.created_at.to_rfc3339(),
        })
    }

    pub async fn list(&self) -> Result<Vec<RosterMember>> {
        let models = RosterMembers::find()
            .order_by_asc(roster_members::Column::Name)
            .all(&self.db)
            .await?;

        models.into_iter().map(Self::model_to_member).collect()
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RosterMember>> {
        let model = RosterMembers::find_by_id(id.to_string())
            .one(&self.db)
            .await?;
        model.map(Self::model_to_member).transpose()
    }

    pub async fn create(&self, member: RosterMember) -> Result<RosterMember> {
        let created_at = chrono::DateTime::parse_from_rfc3339(&member.created_at)
            .unwrap_or_else(|_| chrono::Utc::now().into());

        let model = roster_members::ActiveModel {
            id: ActiveValue::Set(member.id.to_string()),
            name: ActiveValue::Set(member.name),
            nickname: ActiveValue::Set(member.nickname),
            image_url: ActiveValue::Set(member.image_url),
            created_at: ActiveValue::Set(created_at),
        };

        let saved = RosterMembers::insert(model).exec(&self.db).await?;

        let created = RosterMembers::find_by_id(saved.last_insert_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("failed to retrieve created roster member"))?;

        Self::model_to_member(created)
    }

    /// Updates name and nickname; the image is handled separately so a
    /// rename never clobbers an upload in flight.
    pub async fn update_details(
        &self,
        id: Uuid,
        name: String,
        nickname: Option<String>,
    ) -> Result<Option<RosterMember>> {
        let Some(existing) = RosterMembers::find_by_id(id.to_string()).one(&self.db).await? else {
            return Ok(None);
        };

        let updated = roster_members::ActiveModel {
            id: ActiveValue::Unchanged(existing.id),
            name: ActiveValue::Set(name),
            nickname: ActiveValue::Set(nickname),
            image_url: ActiveValue::Unchanged(existing.image_url),
            created_at: ActiveValue::Unchanged(existing.created_at),
        };

        let model = RosterMembers::update(updated).exec(&self.db).await?;
        Self::model_to_member(model).map(Some)
    }

    pub async fn set_image_url(&self, id: Uuid, image_url: String) -> Result<Option<RosterMember>> {
        let Some(existing) = RosterMembers::find_by_id(id.to_string()).one(&self.db).await? else {
            return Ok(None);
        };

        let updated = roster_members::ActiveModel {
            id: ActiveValue::Unchanged(existing.id),
            name: ActiveValue::Unchanged(existing.name),
            nickname: ActiveValue::Unchanged(existing.nickname),
            image_url: ActiveValue::Set(Some(image_url)),
            created_at: ActiveValue::Unchanged(existing.created_at),
        };

        let model = RosterMembers::update(updated).exec(&self.db).await?;
        Self::model_to_member(model).map(Some)
    }

    /// Deletes the member; their stats row goes with them via the foreign
    /// key cascade. Returns whether anything was deleted.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = RosterMembers::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
