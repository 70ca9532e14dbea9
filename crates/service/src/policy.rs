//! Single authorization point for every mutation.
//!
//! An [`Action`] names the role a caller must hold and which party of the resource they must
//! be. Handlers gather the resource's [`Ownership`] facts and call [`authorize`]; reads use
//! [`can_view`] and report a miss as not-found instead.

use uuid::Uuid;

use models::user::Role;

use crate::errors::ServiceError;

/// The authenticated principal behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: Uuid, role: Role) -> Self { Self { user_id, role } }

    pub fn is_client(&self) -> bool { self.role == Role::Client }

    pub fn is_mechanic(&self) -> bool { self.role == Role::Mechanic }
}

/// Who a resource belongs to. `mechanic_user_id` is the user behind the mechanic profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ownership {
    pub client_id: Option<Uuid>,
    pub mechanic_user_id: Option<Uuid>,
}

impl Ownership {
    pub fn client(client_id: Uuid) -> Self { Self { client_id: Some(client_id), mechanic_user_id: None } }

    pub fn mechanic(mechanic_user_id: Uuid) -> Self { Self { client_id: None, mechanic_user_id: Some(mechanic_user_id) } }

    pub fn both(client_id: Uuid, mechanic_user_id: Uuid) -> Self {
        Self { client_id: Some(client_id), mechanic_user_id: Some(mechanic_user_id) }
    }

    pub fn none() -> Self { Self::default() }

    fn is_client(&self, user_id: Uuid) -> bool { self.client_id == Some(user_id) }

    fn is_mechanic(&self, user_id: Uuid) -> bool { self.mechanic_user_id == Some(user_id) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Party {
    Any,
    Client,
    Mechanic,
    Either,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ListVehicles,
    CreateVehicle,
    ManageVehicle,
    CreateRequest,
    EditRequest,
    DeleteRequest,
    CancelRequest,
    CreateQuote,
    EditQuote,
    DecideQuote,
    DeleteQuote,
    CreateBooking,
    EditBooking,
    StartBooking,
    CompleteBooking,
    CancelBooking,
    DeleteBooking,
    CreateReview,
    ManageReview,
    ListOwnReviews,
    EditMechanicProfile,
}

impl Action {
    fn rule(self) -> (Option<Role>, Party) {
        use Action::*;
        match self {
            ListVehicles | CreateVehicle | CreateRequest | ListOwnReviews => (Some(Role::Client), Party::Any),
            ManageVehicle | EditRequest | DeleteRequest | DecideQuote | CreateBooking | CancelBooking
            | DeleteBooking | CreateReview | ManageReview => (Some(Role::Client), Party::Client),
            CreateQuote => (Some(Role::Mechanic), Party::Any),
            CancelRequest | EditQuote | DeleteQuote | StartBooking | CompleteBooking | EditMechanicProfile => {
                (Some(Role::Mechanic), Party::Mechanic)
            }
            EditBooking => (None, Party::Either),
        }
    }

    pub fn describe(self) -> &'static str {
        use Action::*;
        match self {
            ListVehicles => "list vehicles",
            CreateVehicle => "register a vehicle",
            ManageVehicle => "manage this vehicle",
            CreateRequest => "create a service request",
            EditRequest => "edit this service request",
            DeleteRequest => "delete this service request",
            CancelRequest => "cancel this service request",
            CreateQuote => "submit a quote",
            EditQuote => "edit this quote",
            DecideQuote => "accept or reject this quote",
            DeleteQuote => "delete this quote",
            CreateBooking => "book this quote",
            EditBooking => "edit this booking",
            StartBooking => "start work on this booking",
            CompleteBooking => "complete this booking",
            CancelBooking => "cancel this booking",
            DeleteBooking => "delete this booking",
            CreateReview => "review this booking",
            ManageReview => "manage this review",
            ListOwnReviews => "list your reviews",
            EditMechanicProfile => "edit a mechanic profile",
        }
    }
}

/// Checks the caller's role and party for `action`.
pub fn authorize(caller: &Caller, action: Action, ownership: &Ownership) -> Result<(), ServiceError> {
    let (role, party) = action.rule();
    if let Some(required) = role {
        if caller.role != required {
            return Err(ServiceError::forbidden(format!(
                "only a {} may {}",
                required.as_str(),
                action.describe()
            )));
        }
    }
    let allowed = match party {
        Party::Any => true,
        Party::Client => ownership.is_client(caller.user_id),
        Party::Mechanic => ownership.is_mechanic(caller.user_id),
        Party::Either => ownership.is_client(caller.user_id) || ownership.is_mechanic(caller.user_id),
    };
    if !allowed {
        return Err(ServiceError::forbidden(format!("not allowed to {}", action.describe())));
    }
    Ok(())
}

/// Read scoping: a caller sees a resource when they are one of its parties.
pub fn can_view(caller: &Caller, ownership: &Ownership) -> bool {
    ownership.is_client(caller.user_id) || ownership.is_mechanic(caller.user_id)
}
