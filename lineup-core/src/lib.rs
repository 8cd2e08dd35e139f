pub mod league;
pub mod session;
pub mod targets;

// Re-export main components
pub use league::*;
pub use session::*;
pub use targets::*;
