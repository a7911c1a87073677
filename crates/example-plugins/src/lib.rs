//! Reference plugin implementations built on the `Plugin` trait: logging,
//! allowlisting, denylisting, rate limiting, and audit logging.

mod allowlist;
mod audit;
mod denylist;
mod logging;
mod rate_limit;

pub use allowlist::AllowlistPlugin;
pub use audit::{AuditEntry, AuditPlugin};
pub use denylist::DenylistPlugin;
pub use logging::LoggingPlugin;
pub use rate_limit::RateLimitPlugin;
