//! Side-effecting helpers: filesystem, device probes, HTTP clients.

pub mod artifacts;
pub mod config;
pub mod devices;
pub mod exemplars;
pub mod files;
pub mod locator_store;
pub mod oracle;
pub mod pending;
pub mod process;
pub mod prompt;
pub mod run_log;
pub mod testcase;
pub mod webdriver;
