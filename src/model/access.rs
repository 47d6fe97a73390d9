use uuid::Uuid;

use crate::{
    model::{
        ModelManager,
        error::{DatabaseError, DatabaseResult},
    },
    web::{AuthenticatedUser, UserRole},
};

#[async_trait::async_trait]
pub trait HasOwner {
    type OwnerId: PartialEq + Send + Sync;
    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        ctx: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId>;
}

/// Admins reach every resource, everybody else only the ones they own.
pub async fn check_access<T: HasOwner<OwnerId = O>, O: PartialEq + Send + Sync>(
    mm: &ModelManager,
    ctx: &AuthenticatedUser,
    resource: &T,
    expected: O,
) -> DatabaseResult<()> {
    if ctx.user_role() == UserRole::Admin {
        return Ok(());
    }

    let actual_owner = resource.get_owner_id(mm, ctx).await?;
    if actual_owner == expected {
        Ok(())
    } else {
        Err(DatabaseError::Forbidden)
    }
}

/// Same rule for learner-scoped paths where the owner id comes from the URL.
pub fn check_owner(ctx: &AuthenticatedUser, owner_id: Uuid) -> DatabaseResult<()> {
    if ctx.user_role() == UserRole::Admin || ctx.user_id() == owner_id {
        Ok(())
    } else {
        Err(DatabaseError::Forbidden)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn learners_only_reach_their_own_records() {
        let me = Uuid::new_v4();
        let learner = AuthenticatedUser::new(me, UserRole::Learner);

        assert!(check_owner(&learner, me).is_ok());
        assert!(matches!(
            check_owner(&learner, Uuid::new_v4()),
            Err(DatabaseError::Forbidden)
        ));
        assert!(check_owner(&AuthenticatedUser::admin(), me).is_ok());
    }
}
