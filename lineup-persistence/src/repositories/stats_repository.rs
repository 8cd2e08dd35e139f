use anyhow::Result;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait};
use tracing::info;
use uuid::Uuid;

use crate::entities::{player_stats, prelude::*};
use crate::repositories::RosterRepository;
use lineup_core::{league_order, record_loss, record_win};
use lineup_types::PlayerStats as Stats;

#[derive(Clone)]
pub struct StatsRepository {
    db: DatabaseConnection,
}

/// One league table row, ranked and joined with the member it belongs to.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LeagueEntry {
    pub member: lineup_types::RosterMember,
    pub stats: Stats,
    pub points: i32,
    pub rank: u32,
}

impl StatsRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_stats(model: player_stats::Model) -> Result<Stats> {
        Ok(Stats {
            member_id: Uuid::parse_str(&model.member_id)?,
            games_played: model.games_played,
            wins: model.wins,
            losses: model.losses,
            best_turns: model.best_turns,
        })
    }

    /// Members without a row yet report zeroes.
    pub async fn find_by_member(&self, member_id: Uuid) -> Result<Stats> {
        let model = PlayerStats::find_by_id(member_id.to_string())
            .one(&self.db)
            .await?;

        match model {
            Some(model) => Self::model_to_stats(model),
            None => Ok(Stats::zeroed(member_id)),
        }
    }

    async fn save(&self, stats: &Stats) -> Result<()> {
        let exists = PlayerStats::find_by_id(stats.member_id.to_string())
            .one(&self.db)
            .await?
            .is_some();

        let model = player_stats::ActiveModel {
            member_id: if exists {
                ActiveValue::Unchanged(stats.member_id.to_string())
            } else {
                ActiveValue::Set(stats.member_id.to_string())
            },
            games_played: ActiveValue::Set(stats.games_played),
            wins: ActiveValue::Set(stats.wins),
            losses: ActiveValue::Set(stats.losses),
            best_turns: ActiveValue::Set(stats.best_turns),
            updated_at: ActiveValue::Set(chrono::Utc::now().into()),
        };

        if exists {
            PlayerStats::update(model).exec(&self.db).await?;
        } else {
            PlayerStats::insert(model).exec(&self.db).await?;
        }
        Ok(())
    }

    /// Commits a finished session: one win with its turn count, one loss.
    pub async fn record_result(
        &self,
        winner_id: Uuid,
        loser_id: Uuid,
        winner_turns: u32,
    ) -> Result<()> {
        let mut winner = self.find_by_member(winner_id).await?;
        record_win(&mut winner, winner_turns);
        self.save(&winner).await?;

        let mut loser = self.find_by_member(loser_id).await?;
        record_loss(&mut loser);
        self.save(&loser).await?;

        info!(%winner_id, %loser_id, winner_turns, "session result recorded");
        Ok(())
    }

    /// The full league table. Every roster member appears, zeroed rows
    /// included, ranked by points then wins then fewest games.
    pub async fn league(&self, roster: &RosterRepository) -> Result<Vec<LeagueEntry>> {
        let members = roster.list().await?;

        let mut rows = Vec::with_capacity(members.len());
        for member in members {
            let stats = self.find_by_member(member.id).await?;
            rows.push((member, stats));
        }
        rows.sort_by(|(_, a), (_, b)| league_order(a, b));

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(index, (member, stats))| LeagueEntry {
                points: stats.points(),
                rank: (index + 1) as u32,
                member,
                stats,
            })
            .collect())
    }
}
