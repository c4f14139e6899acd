pub mod encryption;
pub mod response;
pub mod serialization;
