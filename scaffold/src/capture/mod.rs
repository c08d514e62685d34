//! Live element capture against a device automation session.

pub mod driver;
pub mod resolver;
pub mod session;

pub use session::{
    CaptureOptions, CaptureReport, CaptureResult, CaptureSession, CaptureState, LocatorSink,
    PendingLocator,
};
