pub mod resource_cache;
pub mod sql_update;
pub mod username_index;
pub mod validators;
