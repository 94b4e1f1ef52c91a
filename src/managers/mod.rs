pub mod bank;
pub mod client;
pub(crate) mod common;
pub mod invoice;
pub mod purchase;
pub mod report;
pub mod supplier;
pub mod system;
