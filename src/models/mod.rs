pub mod event;
pub mod request;
pub mod worker;
