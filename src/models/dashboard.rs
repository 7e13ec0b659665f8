//! Agent dashboard response models
//!
//! GET /api/agent/dashboard-ui payload. Monetary figures are converted to
//! f64 at this edge only; everything upstream stays Decimal.

use serde::Serialize;

use crate::entities::orders::OrderStatus;

/// Headline stats for the dashboard cards
#[derive(Debug, Serialize)]
pub struct AgentStats {
    pub total_sales: f64,
    pub total_earnings: f64,
    pub customers_count: u64,
    pub current_tier: String,
    pub current_tier_color: String,
}

/// Current tier band and progress toward the next one
#[derive(Debug, Serialize)]
pub struct TierInfo {
    pub name: String,
    pub min_sales: f64,
    /// None for the unbounded top tier
    pub max_sales: Option<f64>,
    pub commission_rate: f64,
    pub current_sales: f64,
    pub sales_to_next_tier: f64,
}

/// One quarter of the current calendar year
#[derive(Debug, Serialize)]
pub struct QuarterlySales {
    pub quarter: String,
    pub sales: f64,
    pub orders: u64,
}

/// Recent referral order row
#[derive(Debug, Serialize)]
pub struct RecentSale {
    pub id: i32,
    pub order_reference: String,
    pub full_name: String,
    pub total_amount: f64,
    pub status: OrderStatus,
    /// Date only (YYYY-MM-DD)
    pub created_at: String,
}

/// GET /api/agent/dashboard-ui response
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub stats: AgentStats,
    pub tier_info: TierInfo,
    pub quarterly_data: Vec<QuarterlySales>,
    pub recent_sales: Vec<RecentSale>,
    pub agent_name: String,
}
