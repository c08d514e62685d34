//! Stable exit codes for scaffold CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed for a reason not covered below (I/O, remote errors, bad config).
pub const FAILED: i32 = 1;
/// A precondition was not met: no title, missing credential, unreachable
/// automation endpoint or no online device.
pub const PRECONDITION: i32 = 2;
/// The generation service answered with something outside the artifact contract.
pub const CONTRACT: i32 = 3;
