mod common;
mod test_fetchers;
mod test_session_lifecycle;
