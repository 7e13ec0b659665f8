pub use super::agent_applications::Entity as AgentApplications;
pub use super::agent_tiers::Entity as AgentTiers;
pub use super::agents::Entity as Agents;
pub use super::commissions::Entity as Commissions;
pub use super::orders::Entity as Orders;
pub use super::users::Entity as Users;
