pub mod auth;
pub mod interface;
pub mod keepalive;
pub mod manager;
pub mod session;
pub mod status;
