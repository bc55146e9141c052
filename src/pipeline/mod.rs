pub mod assemble;
pub mod reconcile;
pub mod schema;
