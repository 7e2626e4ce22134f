/// Configuration subsystem - viewer settings and preferences
///
/// This module loads settings from .purexmlrc files. Command line flags are
/// applied on top of whatever the file says.

pub mod rc;

// Re-export public interface
pub use rc::{RC_FILE_NAME, RcConfig, RcLoader};
