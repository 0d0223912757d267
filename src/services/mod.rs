pub mod auth_service;
pub mod email_service;
pub mod email_templates;
pub mod hashing_service;
pub mod token_service;

pub use auth_service::{AuthService, LoginRequest, RegisterRequest, ResetPasswordRequest};
pub use email_service::{create_email_sender, EmailError, EmailSender, LogEmailSender};
pub use hashing_service::{HashError, HashingService};
pub use token_service::{TokenError, TokenService};
