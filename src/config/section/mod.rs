//! Configuration sections for `autoinstall.toml`.

mod compat;
mod control;
mod generator;
mod install;
mod schedule;
mod sources;

pub use compat::CompatConfig;
pub use control::ControlConfig;
pub use generator::GeneratorConfig;
pub use install::InstallConfig;
pub use schedule::ScheduleConfig;
pub use sources::SourcesConfig;
