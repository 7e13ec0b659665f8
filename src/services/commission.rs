//! Tier and commission model
//!
//! Derives an agent's sales band and commission rate from the lifetime sum
//! of non-cancelled referral orders. Bands come from the agent_tiers
//! reference table; a hardcoded fallback table keeps the dashboard total
//! even if the reference rows are missing. Bounds are min-inclusive /
//! max-exclusive, so a total of exactly 25000 lands in silver.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::entities::orders::{self, OrderStatus};
use crate::entities::prelude::*;
use crate::entities::agent_tiers;

/// A sales band with its commission percentage
#[derive(Debug, Clone, PartialEq)]
pub struct TierBand {
    pub name: String,
    pub min_sales: Decimal,
    /// None for the unbounded top tier
    pub max_sales: Option<Decimal>,
    pub commission_rate: Decimal,
}

/// Resolved tier plus the agent's progress within it
#[derive(Debug, Clone)]
pub struct TierStanding {
    pub band: TierBand,
    pub current_sales: Decimal,
    pub sales_to_next_tier: Decimal,
}

/// One quarter of referral activity
#[derive(Debug, Clone)]
pub struct QuarterTotals {
    pub quarter: String,
    pub sales: Decimal,
    pub orders: u64,
}

/// Last-resort bands, mirrored from the seed data
pub fn fallback_bands() -> Vec<TierBand> {
    vec![
        TierBand {
            name: "bronze".to_string(),
            min_sales: Decimal::ZERO,
            max_sales: Some(dec!(25000)),
            commission_rate: dec!(10.00),
        },
        TierBand {
            name: "silver".to_string(),
            min_sales: dec!(25000),
            max_sales: Some(dec!(50000)),
            commission_rate: dec!(20.00),
        },
        TierBand {
            name: "gold".to_string(),
            min_sales: dec!(50000),
            max_sales: None,
            commission_rate: dec!(30.00),
        },
    ]
}

/// Load the tier reference rows ordered by lower bound, falling back to the
/// hardcoded table when the reference data is absent
pub async fn tier_bands(db: &DatabaseConnection) -> Result<Vec<TierBand>, DbErr> {
    let rows = AgentTiers::find()
        .order_by_asc(agent_tiers::Column::MinSales)
        .all(db)
        .await?;

    if rows.is_empty() {
        tracing::warn!("agent_tiers table is empty, using fallback bands");
        return Ok(fallback_bands());
    }

    Ok(rows
        .into_iter()
        .map(|row| TierBand {
            name: row.name,
            min_sales: row.min_sales,
            max_sales: row.max_sales,
            commission_rate: row.commission_rate,
        })
        .collect())
}

/// Select the band whose [min, max) range contains the total. Totals below
/// every band (including negatives) resolve to the lowest band.
pub fn resolve_band(total: Decimal, bands: &[TierBand]) -> &TierBand {
    bands
        .iter()
        .find(|band| {
            total >= band.min_sales && band.max_sales.map_or(true, |max| total < max)
        })
        .unwrap_or(&bands[0])
}

/// Sales still needed to enter the next band; zero at the top tier
pub fn sales_to_next_tier(total: Decimal, band: &TierBand) -> Decimal {
    match band.max_sales {
        Some(max) => (max - total).max(Decimal::ZERO),
        None => Decimal::ZERO,
    }
}

/// Lifetime sales total: sum of non-cancelled referral order amounts
pub async fn lifetime_sales(db: &DatabaseConnection, agent_id: i32) -> Result<Decimal, DbErr> {
    let total: Option<Option<Decimal>> = Orders::find()
        .select_only()
        .column_as(orders::Column::TotalAmount.sum(), "total")
        .filter(orders::Column::AgentId.eq(agent_id))
        .filter(orders::Column::Status.ne(OrderStatus::Cancelled))
        .into_tuple()
        .one(db)
        .await?;

    Ok(total.flatten().unwrap_or(Decimal::ZERO))
}

/// Sales total restricted to a closed-open created_at window
pub async fn sales_in_window(
    db: &DatabaseConnection,
    agent_id: i32,
    from: DateTime<FixedOffset>,
    until: DateTime<FixedOffset>,
) -> Result<Decimal, DbErr> {
    let total: Option<Option<Decimal>> = Orders::find()
        .select_only()
        .column_as(orders::Column::TotalAmount.sum(), "total")
        .filter(orders::Column::AgentId.eq(agent_id))
        .filter(orders::Column::Status.ne(OrderStatus::Cancelled))
        .filter(orders::Column::CreatedAt.gte(from))
        .filter(orders::Column::CreatedAt.lt(until))
        .into_tuple()
        .one(db)
        .await?;

    Ok(total.flatten().unwrap_or(Decimal::ZERO))
}

/// Compute the agent's current standing: band, lifetime sales, and distance
/// to the next band
pub async fn current_standing(
    db: &DatabaseConnection,
    agent_id: i32,
) -> Result<TierStanding, DbErr> {
    let total = lifetime_sales(db, agent_id).await?;
    let bands = tier_bands(db).await?;
    let band = resolve_band(total, &bands).clone();
    let remaining = sales_to_next_tier(total, &band);

    Ok(TierStanding {
        band,
        current_sales: total,
        sales_to_next_tier: remaining,
    })
}

/// Distinct customers (by email) across non-cancelled referral orders
pub async fn customers_count(db: &DatabaseConnection, agent_id: i32) -> Result<u64, DbErr> {
    let count: Option<i64> = Orders::find()
        .select_only()
        .column_as(
            SimpleExpr::from(Func::count_distinct(Expr::col((
                orders::Entity,
                orders::Column::Email,
            )))),
            "customers",
        )
        .filter(orders::Column::AgentId.eq(agent_id))
        .filter(orders::Column::Status.ne(OrderStatus::Cancelled))
        .into_tuple()
        .one(db)
        .await?;

    Ok(count.unwrap_or(0).max(0) as u64)
}

/// Per-quarter sales and order counts for one calendar year
pub async fn quarterly_breakdown(
    db: &DatabaseConnection,
    agent_id: i32,
    year: i32,
) -> Result<Vec<QuarterTotals>, DbErr> {
    let mut quarters = Vec::with_capacity(4);

    for q in 1..=4u32 {
        let (from, until) = quarter_bounds(year, q);

        let sales = sales_in_window(db, agent_id, from, until).await?;
        let orders_count = Orders::find()
            .filter(orders::Column::AgentId.eq(agent_id))
            .filter(orders::Column::Status.ne(OrderStatus::Cancelled))
            .filter(orders::Column::CreatedAt.gte(from))
            .filter(orders::Column::CreatedAt.lt(until))
            .count(db)
            .await?;

        quarters.push(QuarterTotals {
            quarter: format!("Q{}", q),
            sales,
            orders: orders_count,
        });
    }

    Ok(quarters)
}

/// Referral orders since `since`, newest first, capped at `limit`
pub async fn recent_orders(
    db: &DatabaseConnection,
    agent_id: i32,
    since: DateTime<FixedOffset>,
    limit: u64,
) -> Result<Vec<orders::Model>, DbErr> {
    Orders::find()
        .filter(orders::Column::AgentId.eq(agent_id))
        .filter(orders::Column::CreatedAt.gte(since))
        .order_by_desc(orders::Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await
}

/// Closed-open UTC bounds of a calendar quarter
pub fn quarter_bounds(year: i32, quarter: u32) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let start_month = (quarter - 1) * 3 + 1;
    let start = first_of_month(year, start_month);
    let until = if quarter == 4 {
        first_of_month(year + 1, 1)
    } else {
        first_of_month(year, start_month + 3)
    };
    (start, until)
}

/// Midnight UTC on the first day of the current month
pub fn start_of_current_month() -> DateTime<FixedOffset> {
    let now = Utc::now();
    first_of_month(now.year(), now.month())
}

fn first_of_month(year: i32, month: u32) -> DateTime<FixedOffset> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .expect("valid month boundary")
        .and_hms_opt(0, 0, 0)
        .expect("midnight exists")
        .and_utc()
        .fixed_offset()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_total_maps_to_exactly_one_band() {
        let bands = fallback_bands();
        for total in [
            dec!(0),
            dec!(0.01),
            dec!(12500),
            dec!(24999.99),
            dec!(25000),
            dec!(37000),
            dec!(49999.99),
            dec!(50000),
            dec!(1000000),
        ] {
            let hits = bands
                .iter()
                .filter(|band| {
                    total >= band.min_sales && band.max_sales.map_or(true, |max| total < max)
                })
                .count();
            assert_eq!(hits, 1, "total {} should match exactly one band", total);
        }
    }

    #[test]
    fn boundary_totals_promote_to_the_higher_band() {
        let bands = fallback_bands();
        assert_eq!(resolve_band(dec!(24999.99), &bands).name, "bronze");
        assert_eq!(resolve_band(dec!(25000), &bands).name, "silver");
        assert_eq!(resolve_band(dec!(49999.99), &bands).name, "silver");
        assert_eq!(resolve_band(dec!(50000), &bands).name, "gold");
    }

    #[test]
    fn negative_total_falls_back_to_bronze() {
        let bands = fallback_bands();
        assert_eq!(resolve_band(dec!(-10), &bands).name, "bronze");
    }

    #[test]
    fn band_assignment_is_monotonic() {
        let bands = fallback_bands();
        let order = |name: &str| bands.iter().position(|b| b.name == name).unwrap();

        let mut previous = 0;
        for total in [
            dec!(0),
            dec!(100),
            dec!(24999),
            dec!(25000),
            dec!(25001),
            dec!(49999),
            dec!(50000),
            dec!(75000),
        ] {
            let index = order(&resolve_band(total, &bands).name);
            assert!(index >= previous, "band dropped at total {}", total);
            previous = index;
        }
    }

    #[test]
    fn zero_sales_agent_needs_the_full_bronze_band() {
        let bands = fallback_bands();
        let band = resolve_band(Decimal::ZERO, &bands);
        assert_eq!(band.name, "bronze");
        assert_eq!(sales_to_next_tier(Decimal::ZERO, band), dec!(25000));
    }

    #[test]
    fn next_tier_distance_is_zero_at_the_top() {
        let bands = fallback_bands();
        let gold = resolve_band(dec!(80000), &bands);
        assert_eq!(gold.name, "gold");
        assert_eq!(sales_to_next_tier(dec!(80000), gold), Decimal::ZERO);
    }

    #[test]
    fn next_tier_distance_never_goes_negative() {
        let bands = fallback_bands();
        let bronze = &bands[0];
        assert_eq!(sales_to_next_tier(dec!(26000), bronze), Decimal::ZERO);
    }

    #[test]
    fn quarter_bounds_partition_the_year() {
        let (q1_start, q1_end) = quarter_bounds(2026, 1);
        let (q2_start, _) = quarter_bounds(2026, 2);
        let (_, q4_end) = quarter_bounds(2026, 4);

        assert_eq!(q1_start.to_rfc3339(), "2026-01-01T00:00:00+00:00");
        assert_eq!(q1_end, q2_start);
        assert_eq!(q4_end.to_rfc3339(), "2027-01-01T00:00:00+00:00");
    }
}
