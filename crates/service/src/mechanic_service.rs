use uuid::Uuid;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::info;

use models::{mechanic, user};

use crate::errors::ServiceError;
use crate::policy::{authorize, Action, Caller, Ownership};

/// Public view of a mechanic: the profile plus the owning user's contact details.
#[derive(Debug, Clone, Serialize)]
pub struct MechanicProfile {
    #[serde(flatten)]
    pub mechanic: mechanic::Model,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMechanicProfile {
    pub certification: Option<String>,
    pub specialization: Option<String>,
    pub service_area: Option<String>,
    pub rate: Option<f64>,
    pub availability: Option<String>,
}

/// The caller's own mechanic profile.
pub(crate) async fn profile_of<C: ConnectionTrait>(db: &C, caller: &Caller) -> Result<mechanic::Model, ServiceError> {
    mechanic::find_by_user(db, caller.user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("mechanic profile"))
}

/// The user id behind a mechanic profile.
pub(crate) async fn user_of<C: ConnectionTrait>(db: &C, mechanic_id: Uuid) -> Result<Uuid, ServiceError> {
    mechanic::Entity::find_by_id(mechanic_id)
        .one(db)
        .await?
        .map(|m| m.user_id)
        .ok_or_else(|| ServiceError::not_found("mechanic"))
}

pub async fn find_by_user(db: &DatabaseConnection, user_id: Uuid) -> Result<Option<mechanic::Model>, ServiceError> {
    Ok(mechanic::find_by_user(db, user_id).await?)
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<MechanicProfile, ServiceError> {
    let (m, u) = mechanic::Entity::find_by_id(id)
        .find_also_related(user::Entity)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("mechanic"))?;
    let u = u.ok_or_else(|| ServiceError::not_found("mechanic"))?;
    Ok(MechanicProfile { mechanic: m, name: u.name, email: u.email, phone: u.phone })
}

pub async fn update_profile(
    db: &DatabaseConnection,
    caller: &Caller,
    input: UpdateMechanicProfile,
) -> Result<mechanic::Model, ServiceError> {
    authorize(caller, Action::EditMechanicProfile, &Ownership::mechanic(caller.user_id))?;
    let found = profile_of(db, caller).await?;
    if input.certification.is_none()
        && input.specialization.is_none()
        && input.service_area.is_none()
        && input.rate.is_none()
        && input.availability.is_none()
    {
        return Err(ServiceError::Validation("no updates provided".into()));
    }

    let id = found.id;
    let mut am: mechanic::ActiveModel = found.into();
    if let Some(v) = input.certification { am.certification = Set(Some(v)); }
    if let Some(v) = input.specialization { am.specialization = Set(Some(v)); }
    if let Some(v) = input.service_area { am.service_area = Set(Some(v)); }
    if let Some(rate) = input.rate {
        mechanic::validate_rate(rate)?;
        am.rate = Set(Some(rate));
    }
    if let Some(v) = input.availability { am.availability = Set(Some(v)); }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(event = "mechanic_profile_updated", mechanic_id = %id, "mechanic profile updated");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client, get_db, mechanic};

    #[tokio::test]
    async fn get_joins_user_details() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let (_, mid) = mechanic(&db, "m@example.com").await?;
        let view = get(&db, mid).await?;
        assert_eq!(view.email, "m@example.com");
        assert_eq!(view.mechanic.rating, None);
        assert!(matches!(get(&db, Uuid::new_v4()).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn update_profile_is_mechanic_only() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let (m, _) = mechanic(&db, "m@example.com").await?;
        let c = client(&db, "c@example.com").await?;

        let input = UpdateMechanicProfile { specialization: Some("brakes".into()), rate: Some(65.0), ..Default::default() };
        assert!(matches!(update_profile(&db, &c, input.clone()).await, Err(ServiceError::Forbidden(_))));
        let updated = update_profile(&db, &m, input).await?;
        assert_eq!(updated.specialization.as_deref(), Some("brakes"));
        assert_eq!(updated.rate, Some(65.0));

        let err = update_profile(&db, &m, UpdateMechanicProfile::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let err = update_profile(&db, &m, UpdateMechanicProfile { rate: Some(-1.0), ..Default::default() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        Ok(())
    }
}
