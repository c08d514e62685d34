//! Mobile UI test scaffolder.
//!
//! Turns a plain-text manual test case into WebdriverIO + Appium artifacts:
//! a spec, a page object and a locator file. Selectors can be captured from
//! a live device first so the generated code uses real element locators.
//!
//! - **[`core`]**: pure logic (document parsing, action synthesis, locator
//!   keys, selectors, the artifact contract). No I/O.
//! - **[`capture`]**: the device capture state machine behind driver traits.
//! - **[`io`]**: filesystem, device probes and HTTP clients.
//!
//! [`generate`] wires these together for the CLI.

pub mod capture;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod generate;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
