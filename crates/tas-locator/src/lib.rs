//! Nearest-branch lookup driven by the visitor's device location.

pub mod banner;
pub mod capability;
pub mod error;
pub mod resolver;
pub mod status;

pub use banner::Banner;
pub use capability::{
    FixedPermission, FixedPosition, MemorySessionStore, PermissionQueryError, PermissionSource,
    PermissionState, PositionError, PositionErrorCode, PositionOptions, PositionSource,
    SessionStore, Unsupported, DISMISSED_KEY,
};
pub use error::LocateError;
pub use resolver::NearestBranchResolver;
pub use status::{LocationStatus, Resolution};
