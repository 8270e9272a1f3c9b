pub mod config;
pub mod presets;
pub mod report;

pub use config::{run_config_init, run_config_show};
pub use presets::run_presets;
pub use report::{run_agg, run_preset};
