//! Command implementations.

mod assets;
mod info;
mod run;
mod validate;

pub use assets::run_assets;
pub use info::run_info;
pub use run::run_session;
pub use validate::run_validate;
