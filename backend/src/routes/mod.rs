/// Router Module Index
///
/// One router per access tier. Every tree except `public` is wrapped in the route guard
/// by `create_router`, with the role set returned by its `required_roles()`.

/// Pages and endpoints reachable without a session.
pub mod public;

/// Administrator views.
pub mod admin;

/// Agent views.
pub mod agent;

/// Client views, including ticket creation.
pub mod client;

/// Views every signed-in role shares.
pub mod shared;
