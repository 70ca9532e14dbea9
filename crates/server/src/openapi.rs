//! OpenAPI document served at `/api-docs/openapi.json`.
//!
//! The `*Request` structs only describe request bodies; handlers deserialize into the
//! service input types.

use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// `client` or `mechanic`
    pub role: String,
    pub phone: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct UpdateProfileRequest { pub name: Option<String>, pub phone: Option<String> }

#[derive(ToSchema)]
pub struct ChangePasswordRequest { pub current_password: String, pub new_password: String }

#[derive(ToSchema)]
pub struct UpdateMechanicProfileRequest {
    pub certification: Option<String>,
    pub specialization: Option<String>,
    pub service_area: Option<String>,
    pub rate: Option<f64>,
    pub availability: Option<String>,
}

#[derive(ToSchema)]
pub struct CreateVehicleRequest {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub license_plate: String,
    /// 17 characters, no I, O or Q
    pub vin: String,
}

#[derive(ToSchema)]
pub struct UpdateVehicleRequest {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub license_plate: Option<String>,
    pub vin: Option<String>,
}

#[derive(ToSchema)]
pub struct CreateServiceRequestRequest {
    pub vehicle_id: Uuid,
    pub service_type: String,
    pub description: String,
    pub location: String,
    /// low, medium, high or emergency
    pub urgency: String,
    pub preferred_date: String,
    pub photo: Option<String>,
}

#[derive(ToSchema)]
pub struct UpdateServiceRequestRequest {
    pub service_type: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub urgency: Option<String>,
    pub preferred_date: Option<String>,
    pub photo: Option<String>,
    /// Only `cancelled` may be set directly.
    pub status: Option<String>,
}

#[derive(ToSchema)]
pub struct CreateQuoteRequest {
    pub request_id: Uuid,
    pub cost: f64,
    pub time_required: String,
    pub parts_needed: Option<String>,
    pub availability: String,
}

#[derive(ToSchema)]
pub struct UpdateQuoteRequest {
    pub cost: Option<f64>,
    pub time_required: Option<String>,
    pub parts_needed: Option<String>,
    pub availability: Option<String>,
    /// Client decision: `accepted` or `rejected`
    pub status: Option<String>,
}

#[derive(ToSchema)]
pub struct CreateBookingRequest {
    pub quote_id: Uuid,
    pub scheduled_date: String,
    pub notes: Option<String>,
}

#[derive(ToSchema)]
pub struct UpdateBookingRequest {
    pub scheduled_date: Option<String>,
    pub notes: Option<String>,
    /// in_progress, completed or cancelled
    pub status: Option<String>,
}

#[derive(ToSchema)]
pub struct CreateReviewRequest {
    pub booking_id: Uuid,
    /// 1 to 5
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(ToSchema)]
pub struct UpdateReviewRequest { pub rating: Option<i32>, pub comment: Option<String> }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::profile,
        crate::routes::auth::update_profile,
        crate::routes::auth::change_password,
        crate::routes::mechanics::get,
        crate::routes::mechanics::update_profile,
        crate::routes::vehicles::list,
        crate::routes::vehicles::create,
        crate::routes::vehicles::get,
        crate::routes::vehicles::update,
        crate::routes::vehicles::delete,
        crate::routes::requests::list,
        crate::routes::requests::create,
        crate::routes::requests::get,
        crate::routes::requests::update,
        crate::routes::requests::delete,
        crate::routes::quotes::list,
        crate::routes::quotes::create,
        crate::routes::quotes::get,
        crate::routes::quotes::update,
        crate::routes::quotes::delete,
        crate::routes::bookings::list,
        crate::routes::bookings::create,
        crate::routes::bookings::get,
        crate::routes::bookings::update,
        crate::routes::bookings::delete,
        crate::routes::reviews::create,
        crate::routes::reviews::my_reviews,
        crate::routes::reviews::update,
        crate::routes::reviews::delete,
        crate::routes::reviews::for_mechanic,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            UpdateProfileRequest,
            ChangePasswordRequest,
            UpdateMechanicProfileRequest,
            CreateVehicleRequest,
            UpdateVehicleRequest,
            CreateServiceRequestRequest,
            UpdateServiceRequestRequest,
            CreateQuoteRequest,
            UpdateQuoteRequest,
            CreateBookingRequest,
            UpdateBookingRequest,
            CreateReviewRequest,
            UpdateReviewRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "mechanics"),
        (name = "vehicles"),
        (name = "requests"),
        (name = "quotes"),
        (name = "bookings"),
        (name = "reviews")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_lifecycle_paths() {
        let doc = ApiDoc::openapi();
        for p in ["/api/auth/register", "/api/quotes/{id}", "/api/bookings", "/api/reviews/mechanic/{mechanic_id}"] {
            assert!(doc.paths.paths.contains_key(p), "missing {p}");
        }
    }
}
