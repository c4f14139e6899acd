pub mod api_client;
pub mod headers;
pub mod http_client;
