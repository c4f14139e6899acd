pub mod instagram_service;
pub mod media_proxy;
pub mod post_service;
pub mod resolver;
pub mod story_service;
