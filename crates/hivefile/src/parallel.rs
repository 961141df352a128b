//! Collective (multi-process) I/O capability.
//!
//! The accessor never links a process-group runtime itself. Instead, a
//! [`CollectiveDriver`] describes the cooperating process group, and an
//! embedding that has one (MPI or otherwise) installs it once per process at
//! startup. Any [`ContainerFile::open`] call with `parallel = true` that runs
//! without an installed driver fails with [`Error::Configuration`] before
//! touching the filesystem — there is deliberately no silent fallback to
//! independent I/O, which would break consistency under concurrent writers.
//!
//! [`ContainerFile::open`]: crate::ContainerFile::open
//! [`Error::Configuration`]: crate::Error::Configuration

use std::sync::OnceLock;

use crate::error::Error;

/// The process-group surface collective sessions need.
///
/// Implementations bind this to a real communicator. `barrier` must not
/// return on any rank until every rank of the group has entered it.
pub trait CollectiveDriver: Send + Sync {
    /// This process's rank within the group (0-based).
    fn rank(&self) -> u32;

    /// Number of processes in the group.
    fn size(&self) -> u32;

    /// Block until all ranks reach this point.
    fn barrier(&self);
}

static DRIVER: OnceLock<Box<dyn CollectiveDriver>> = OnceLock::new();

/// Install the process-wide collective driver.
///
/// May be called at most once per process; a second call fails with
/// [`Error::Configuration`] and leaves the first driver in place.
pub fn install_driver(driver: Box<dyn CollectiveDriver>) -> Result<(), Error> {
    DRIVER.set(driver).map_err(|_| {
        Error::Configuration("a collective driver is already installed".into())
    })
}

/// The installed driver, if any.
pub fn driver() -> Option<&'static dyn CollectiveDriver> {
    DRIVER.get().map(|b| b.as_ref())
}

/// Trivial driver for a group of one process.
///
/// Useful in tests and in tools that run the collective code path without a
/// real process-group runtime: rank 0 of a size-1 group, no-op barrier.
#[derive(Debug, Default)]
pub struct SoloDriver;

impl CollectiveDriver for SoloDriver {
    fn rank(&self) -> u32 {
        0
    }

    fn size(&self) -> u32 {
        1
    }

    fn barrier(&self) {}
}
