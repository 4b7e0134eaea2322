//! Component test suite

mod test_config;
mod test_content;
mod test_delivery;
mod test_lifecycle;
mod test_localization;
mod test_payload;
