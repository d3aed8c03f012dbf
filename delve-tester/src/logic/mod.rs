pub mod autopilot;
pub mod history;
pub mod policy;
pub mod reports;

pub use autopilot::{Autopilot, RunReport};
pub use history::{load_history, synthesize_history};
pub use policy::DelveStrategy;
pub use reports::CampaignReport;
