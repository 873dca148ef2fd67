//! CLI commands

mod check;
mod eval;
mod init;
mod scan;
mod validate;

pub use check::CheckCommand;
pub use eval::EvalCommand;
pub use init::InitCommand;
pub use scan::ScanCommand;
pub use validate::ValidateCommand;
