use std::sync::Arc;

use crate::database::Storage;
use crate::models::JwtKeys;

pub struct AppState {
    pub db: Arc<dyn Storage>,
    pub keys: JwtKeys,
}

impl AppState {
    pub fn new(db: Arc<dyn Storage>, jwt_secret: &str) -> Self {
        AppState {
            db,
            keys: JwtKeys::new(jwt_secret.as_bytes()),
        }
    }
}
