pub mod config;
pub mod inbox;
pub mod project;
pub mod vault;

pub use config::*;
pub use inbox::*;
pub use project::*;
pub use vault::*;
