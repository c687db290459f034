use std::sync::Arc;

use crate::application::recache::RecacheService;

#[derive(Clone)]
pub struct RecacheState {
    pub service: Arc<RecacheService>,
}

impl RecacheState {
    pub fn new(service: Arc<RecacheService>) -> Self {
        Self { service }
    }
}
