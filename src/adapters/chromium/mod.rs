pub mod endpoint;
pub mod session;
