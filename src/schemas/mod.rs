use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod assistant;
pub(crate) mod course;
pub(crate) mod feedback;
pub(crate) mod module;
pub(crate) mod task;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
}
