/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules.
/// Access control is applied explicitly at the module level via Axum layers,
/// so a protected endpoint cannot be exposed by accident.

/// Routes accessible without a credential: health probe and the credential
/// exchange endpoints (register, login).
pub mod public;

/// Routes behind the Identity extractor middleware. Every handler here sees a
/// verified identity; per-operation role requirements are declared via
/// RouteAccess records inside the handlers.
pub mod authenticated;

/// Routes restricted exclusively to the ADMIN role.
pub mod admin;
