pub mod campaigns;
pub mod health;
pub mod redirect;

pub use campaigns::{CampaignApi, campaign_routes};
pub use health::{AppStartTime, HealthService, health_routes};
pub use redirect::{RedirectService, redirect_routes};
