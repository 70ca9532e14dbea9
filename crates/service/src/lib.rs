//! Service layer providing the marketplace's business operations on top of models.
//! - Every mutation is authorized through `policy` and status moves follow `models::lifecycle`.
//! - Guarded transitions run inside one database transaction.
//! - Handlers stay thin: they map `errors::ServiceError` onto HTTP responses.

pub mod errors;
pub mod policy;
pub mod auth;
pub mod mechanic_service;
pub mod vehicle_service;
pub mod request_service;
pub mod quote_service;
pub mod booking_service;
pub mod review_service;
#[cfg(test)]
pub mod test_support;
