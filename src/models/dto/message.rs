use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic `{"message": ...}` body used for errors and simple acknowledgements.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}
