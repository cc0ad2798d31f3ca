//! Permission adapters - implementations of the PermissionChecker port.
//!
//! - `StubPermissionChecker` - Fixed answers for development and tests
//! - `RolePermissionChecker` - Role to record type to operations table

mod role_permission_checker;
mod stub_permission_checker;

pub use role_permission_checker::{RolePermissionChecker, RoleTableError};
pub use stub_permission_checker::StubPermissionChecker;
