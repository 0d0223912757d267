pub mod activation_token;
pub mod session;
pub mod user;

pub use activation_token::{ActivationPurpose, ActivationToken, UnknownPurpose};
pub use session::{SessionClaims, TokenKind, TokenPair};
pub use user::User;
