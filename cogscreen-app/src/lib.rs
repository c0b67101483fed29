pub mod config;
pub mod participant;
pub mod report;
pub mod session;

pub use config::{parse_override, AppConfig, ConfigError, OverrideEntry, RunSection};
pub use participant::{Planned, SimulatedParticipant};
pub use report::{render, write_json, ReportError};
pub use session::{run_offline, run_realtime, RunReport};
