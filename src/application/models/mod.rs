pub mod identity;
pub mod media;
pub mod payload;
