pub mod errors;
pub mod db;
pub mod lifecycle;
pub mod user;
pub mod user_credentials;
pub mod mechanic;
pub mod vehicle;
pub mod service_request;
pub mod quote;
pub mod booking;
pub mod review;

#[cfg(test)]
mod tests;
