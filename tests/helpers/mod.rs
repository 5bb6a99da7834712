pub mod builders;
pub mod db;

pub use builders::PendingRequestBuilder;
pub use db::TestDb;
