//! Credential handling and token issuance.

pub mod credentials;
pub mod error;
pub mod flow;
pub mod password;
pub mod policy;
pub mod token;

pub use credentials::Credentials;
pub use error::{AuthError, ValidationError};
pub use flow::Authenticator;
pub use policy::Policy;
pub use token::{Claims, TokenError, TokenKeys};
