pub mod chat;
pub mod rider;
