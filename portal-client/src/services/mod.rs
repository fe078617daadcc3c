pub mod events;
pub mod gateway;
pub mod logout;
pub mod permissions;
pub mod session_store;
