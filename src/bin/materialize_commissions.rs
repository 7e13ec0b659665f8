// src/bin/materialize_commissions.rs
//
// Yearly commission snapshot backfill. For every active agent, sums the
// calendar-year referral sales, resolves the tier in effect, computes the
// earned commission, and upserts the commissions row for that period. Also
// the only writer of the rolling totals on the agents table.

use std::env;

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, EntityTrait, QueryFilter, QueryOrder, Set,
};

use unimarket_backend::entities::{agent_tiers, agents, commissions, prelude::*};
use unimarket_backend::services::commission::{
    lifetime_sales, quarter_bounds, resolve_band, sales_in_window, tier_bands,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Usage: cargo run --bin materialize_commissions -- [year]
    let args: Vec<String> = env::args().collect();
    let year: i32 = match args.get(1) {
        Some(raw) => raw.parse()?,
        None => Utc::now().year(),
    };

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::connect(&database_url).await?;

    let period_start = NaiveDate::from_ymd_opt(year, 1, 1).expect("year start");
    let period_end = NaiveDate::from_ymd_opt(year, 12, 31).expect("year end");
    let (window_start, _) = quarter_bounds(year, 1);
    let (_, window_end) = quarter_bounds(year, 4);

    let bands = tier_bands(&db).await?;

    let active_agents = Agents::find()
        .filter(agents::Column::IsActive.eq(true))
        .all(&db)
        .await?;

    println!("Materializing {} commissions for {} agents", year, active_agents.len());

    let mut created = 0;
    let mut updated = 0;

    for agent in active_agents {
        let year_sales = sales_in_window(&db, agent.id, window_start, window_end).await?;
        let band = resolve_band(year_sales, &bands);
        let commission = year_sales * band.commission_rate / Decimal::from(100);

        let tier_id: Option<i32> = AgentTiers::find()
            .filter(agent_tiers::Column::Name.eq(band.name.as_str()))
            .one(&db)
            .await?
            .map(|tier| tier.id);

        let existing = Commissions::find()
            .filter(commissions::Column::AgentId.eq(agent.id))
            .filter(commissions::Column::PeriodStart.eq(period_start))
            .order_by_desc(commissions::Column::CreatedAt)
            .one(&db)
            .await?;

        let now = Utc::now().fixed_offset();
        match existing {
            Some(snapshot) => {
                let mut snapshot: commissions::ActiveModel = snapshot.into();
                snapshot.total_sales = Set(year_sales);
                snapshot.total_commission = Set(commission);
                snapshot.tier_id = Set(tier_id);
                snapshot.updated_at = Set(now);
                snapshot.update(&db).await?;
                updated += 1;
            }
            None => {
                let snapshot = commissions::ActiveModel {
                    agent_id: Set(agent.id),
                    total_sales: Set(year_sales),
                    total_commission: Set(commission),
                    tier_id: Set(tier_id),
                    period_start: Set(Some(period_start)),
                    period_end: Set(Some(period_end)),
                    ..Default::default()
                };
                snapshot.insert(&db).await?;
                created += 1;
            }
        }

        // Refresh the rolling lifetime totals alongside the snapshot
        let lifetime = lifetime_sales(&db, agent.id).await?;
        let lifetime_band = resolve_band(lifetime, &bands);
        let lifetime_commission = lifetime * lifetime_band.commission_rate / Decimal::from(100);

        let mut rolling: agents::ActiveModel = agent.into();
        rolling.total_sales = Set(lifetime);
        rolling.total_commission = Set(lifetime_commission);
        rolling.updated_at = Set(now);
        rolling.update(&db).await?;
    }

    println!("Done: {} snapshots created, {} updated", created, updated);

    Ok(())
}
