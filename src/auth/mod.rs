//! Authentication: stateless HS256 access tokens, the middleware that gates the
//! admin routes, and password hashing for stored credentials.

pub mod gate;
pub mod password;
pub mod token;

pub use gate::{CurrentUser, GateError, auth_gate, authenticate};
pub use token::{Claims, TOKEN_LIFETIME_SECS, TokenCodec, TokenError};
