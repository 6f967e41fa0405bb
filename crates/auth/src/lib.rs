//! `frontdesk-auth`: session state and role-gated routing.
//!
//! This crate is decoupled from rendering, HTTP and storage. The identity
//! provider is reached only through the [`IdentityProvider`] trait.

pub mod claims;
pub mod guard;
pub mod identity;
pub mod policy;
pub mod roles;
pub mod route;
pub mod session;

pub use claims::{ClaimsError, IdTokenClaims, TokenValidationError, decode_claims, roles_from_token, validate_claims};
pub use guard::{GuardDecision, GuardExplanation, NavLink, evaluate, explain, navigation_links, resolve_root};
pub use identity::{AuthError, AuthService, AuthenticationResult, IdentityError, IdentityProvider};
pub use policy::{Access, RoutePolicy};
pub use roles::{Role, RoleSet, UnknownRole};
pub use route::{Route, RouteKind};
pub use session::{Account, Session, SessionHandle};
