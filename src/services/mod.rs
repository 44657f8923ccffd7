pub(crate) mod authorization;
pub(crate) mod enrollment;
pub(crate) mod storage;
pub(crate) mod task_status;
