//! Agent dashboard handler
//!
//! GET /api/agent/dashboard-ui for approved agents: headline stats, tier
//! standing, quarterly breakdown, and recent referral sales. Everything is
//! recomputed from the orders table on each read; the commissions snapshot
//! only feeds the earnings figure.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::{Datelike, Utc};
use rust_decimal::prelude::ToPrimitive;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::error;

use crate::AppState;
use crate::entities::prelude::*;
use crate::entities::{agents, commissions};
use crate::handlers::auth::require_user;
use crate::models::application::ErrorResponse;
use crate::models::dashboard::{
    AgentStats, DashboardResponse, QuarterlySales, RecentSale, TierInfo,
};
use crate::services::commission;

/// Assemble the dashboard payload for the authenticated agent
///
/// GET /api/agent/dashboard-ui
pub async fn get_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardResponse>, (StatusCode, Json<ErrorResponse>)> {
    let user_id = require_user(&headers)?;

    let agent = Agents::find()
        .filter(agents::Column::UserId.eq(user_id))
        .one(&state.db)
        .await
        .map_err(|err| db_error(state.debug, &err))?
        .ok_or((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Agent profile not found.".to_string(),
            }),
        ))?;

    let account = Users::find_by_id(user_id)
        .one(&state.db)
        .await
        .map_err(|err| db_error(state.debug, &err))?;

    let standing = commission::current_standing(&state.db, agent.id)
        .await
        .map_err(|err| db_error(state.debug, &err))?;

    let year = Utc::now().year();

    // Latest commission snapshot falling inside the current year
    let year_start = chrono::NaiveDate::from_ymd_opt(year, 1, 1).expect("year start");
    let year_end = chrono::NaiveDate::from_ymd_opt(year, 12, 31).expect("year end");
    let current_snapshot = Commissions::find()
        .filter(commissions::Column::AgentId.eq(agent.id))
        .filter(commissions::Column::PeriodStart.gte(year_start))
        .filter(commissions::Column::PeriodStart.lte(year_end))
        .order_by_desc(commissions::Column::CreatedAt)
        .one(&state.db)
        .await
        .map_err(|err| db_error(state.debug, &err))?;

    let customers = commission::customers_count(&state.db, agent.id)
        .await
        .map_err(|err| db_error(state.debug, &err))?;

    let quarterly = commission::quarterly_breakdown(&state.db, agent.id, year)
        .await
        .map_err(|err| db_error(state.debug, &err))?;

    let recent = commission::recent_orders(
        &state.db,
        agent.id,
        commission::start_of_current_month(),
        10,
    )
    .await
    .map_err(|err| db_error(state.debug, &err))?;

    let tier_name = standing.band.name.clone();
    let total_earnings = current_snapshot
        .map(|snapshot| snapshot.total_commission)
        .unwrap_or_default();

    let response = DashboardResponse {
        stats: AgentStats {
            total_sales: to_f64(standing.current_sales),
            total_earnings: to_f64(total_earnings),
            customers_count: customers,
            current_tier: tier_name.clone(),
            current_tier_color: tier_color(&tier_name).to_string(),
        },
        tier_info: TierInfo {
            name: standing.band.name.clone(),
            min_sales: to_f64(standing.band.min_sales),
            max_sales: standing.band.max_sales.map(to_f64),
            commission_rate: to_f64(standing.band.commission_rate),
            current_sales: to_f64(standing.current_sales),
            sales_to_next_tier: to_f64(standing.sales_to_next_tier),
        },
        quarterly_data: quarterly
            .into_iter()
            .map(|quarter| QuarterlySales {
                quarter: quarter.quarter,
                sales: to_f64(quarter.sales),
                orders: quarter.orders,
            })
            .collect(),
        recent_sales: recent
            .into_iter()
            .map(|order| RecentSale {
                id: order.id,
                order_reference: order.order_reference,
                full_name: order.full_name,
                total_amount: to_f64(order.total_amount),
                status: order.status,
                created_at: order.created_at.date_naive().to_string(),
            })
            .collect(),
        agent_name: account.map(|user| user.name).unwrap_or_default(),
    };

    Ok(Json(response))
}

/// UI badge colour keyed off the tier name
fn tier_color(tier: &str) -> &'static str {
    match tier {
        "silver" => "silver",
        "gold" => "gold",
        _ => "bronze",
    }
}

fn to_f64(value: rust_decimal::Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn db_error(debug: bool, err: &dyn std::fmt::Display) -> (StatusCode, Json<ErrorResponse>) {
    error!(error = %err, "dashboard query failed");
    let error = if debug {
        format!("Database error: {}", err)
    } else {
        "Internal server error".to_string()
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error }))
}
