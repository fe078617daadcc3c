pub mod permission;
pub mod session;

pub use permission::{AccessDecision, PermissionGrant, RbacUser, RbacUsersResponse};
pub use session::SessionRecord;
