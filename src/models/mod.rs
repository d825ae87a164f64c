pub mod account;
pub mod dto;
pub mod error;
pub mod token_claim;
pub use account::Account;
pub use error::{AuthError, Error};
pub use token_claim::{JwtKeys, TokenClaim};
