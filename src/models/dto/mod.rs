pub mod account;
pub mod message;
pub mod session;
pub mod transaction;
pub use account::*;
pub use message::Message;
pub use session::*;
pub use transaction::*;

use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
#[derive(OpenApi)]
#[openapi(
    components(
        schemas(
            Message,
            LoginInfo,
            TokenResponse,
            NewAccount,
            DeleteAccount,
            AccountResponse,
            AccountDeleted,
            DepositRequest,
            DepositResponse,
            TransferRequest,
            TransactionReceipt,
            TransferResponse,
        ),
    ),
    modifiers(&SecurityAddon)
)]
/// Captures OpenAPI schemas and canned responses defined in the DTO module
pub struct OpenApiSchemas;

pub struct SecurityAddon;
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}
