pub mod ddl;
pub mod diff;
pub mod mapper;
pub mod migration;
