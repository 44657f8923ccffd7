pub(crate) mod courses;
pub(crate) mod feedback;
pub(crate) mod modules;
pub(crate) mod tasks;
pub(crate) mod users_data;
