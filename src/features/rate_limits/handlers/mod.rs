pub mod rate_limit_handler;

pub use rate_limit_handler::provision_rate_limit;
