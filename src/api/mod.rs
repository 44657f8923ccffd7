pub(crate) mod assistants;
pub(crate) mod courses;
pub(crate) mod enrollment;
pub(crate) mod errors;
pub(crate) mod favourites;
pub(crate) mod feedback;
pub(crate) mod handlers;
pub(crate) mod modules;
pub(crate) mod pagination;
pub(crate) mod router;
pub(crate) mod tasks;

#[cfg(test)]
mod tests;
