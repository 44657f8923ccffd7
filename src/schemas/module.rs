use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::{Module, Resource};

#[derive(Debug, Deserialize)]
pub(crate) struct ModuleCreate {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) owner_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModuleUpdate {
    pub(crate) modifier_id: Option<String>,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) position: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ModuleResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) position: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ModuleResponse {
    pub(crate) fn from_db(module: Module) -> Self {
        Self {
            id: module.id,
            course_id: module.course_id,
            title: module.title,
            description: module.description,
            position: module.position,
            created_at: format_primitive(module.created_at),
            updated_at: format_primitive(module.updated_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResourceCreate {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) mimetype: Option<String>,
    pub(crate) source: Option<String>,
    pub(crate) id_creator: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResourceUpdate {
    pub(crate) modifier_id: Option<String>,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) mimetype: Option<String>,
    #[serde(default)]
    pub(crate) source: Option<String>,
    #[serde(default)]
    pub(crate) position: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResourceResponse {
    pub(crate) id: String,
    pub(crate) module_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) mimetype: String,
    pub(crate) source: String,
    pub(crate) position: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ResourceResponse {
    pub(crate) fn from_db(resource: Resource) -> Self {
        Self {
            id: resource.id,
            module_id: resource.module_id,
            title: resource.title,
            description: resource.description,
            mimetype: resource.mimetype,
            source: resource.source,
            position: resource.position,
            created_at: format_primitive(resource.created_at),
            updated_at: format_primitive(resource.updated_at),
        }
    }
}
