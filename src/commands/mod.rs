//! CLI command implementations.

pub mod extract;
pub mod fetch;
pub mod window;

pub use extract::ExtractCommand;
pub use fetch::FetchCommand;
pub use window::WindowCommand;
