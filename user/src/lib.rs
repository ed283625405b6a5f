//! Accounts for the Marginalia backend: the user model and its roles,
//! storage on the shared pool, the signup/confirmation-code flow, and
//! access-token issuance.

pub mod error;
pub mod mailer;
pub mod model;
pub mod signup;
pub mod store;
pub mod token;

pub use error::{Result as UserResult, UserError};
pub use mailer::{Mailer, MailerConfig};
pub use model::{
    validate_email, validate_username, NewUser, ProfilePatch, User, UserPatch, RESERVED_USERNAME,
};
pub use signup::{SignupConfig, SignupManager};
pub use store::UserStore;
pub use token::{Claims, TokenConfig, TokenManager};
