//! Server-side login sessions.
//!
//! The browser only ever holds an opaque random token; role and identity live
//! in the `sessions` table and are looked up on every request.

use crate::{
    core::auth::Identity,
    entities::{Role, Session, session},
    errors::Result,
};
use chrono::{Duration, Utc};
use sea_orm::{Set, prelude::*};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Stores a new session for `identity` and returns it.
#[instrument(skip(db, identity), fields(role = ?identity.role))]
pub async fn create_session(
    db: &DatabaseConnection,
    identity: &Identity,
    ttl_hours: i64,
) -> Result<session::Model> {
    let now = Utc::now();
    let session = session::ActiveModel {
        token: Set(Uuid::new_v4().to_string()),
        role: Set(identity.role),
        identity: Set(identity.identity.clone()),
        created_at: Set(now),
        expires_at: Set(now + Duration::hours(ttl_hours)),
    };
    session.insert(db).await.map_err(Into::into)
}

/// Looks up a session token. Expired sessions are deleted and resolve to `None`.
pub async fn resolve_session(db: &DatabaseConnection, token: &str) -> Result<Option<Identity>> {
    let Some(found) = Session::find_by_id(token.to_string()).one(db).await? else {
        return Ok(None);
    };

    if found.expires_at <= Utc::now() {
        debug!("Session expired, removing");
        Session::delete_by_id(found.token).exec(db).await?;
        return Ok(None);
    }

    Ok(Some(Identity {
        role: found.role,
        identity: found.identity,
    }))
}

/// Deletes a session. Unknown tokens are ignored.
pub async fn end_session(db: &DatabaseConnection, token: &str) -> Result<()> {
    Session::delete_by_id(token.to_string()).exec(db).await?;
    Ok(())
}

/// Removes every session of one account, e.g. after it is deleted.
///
/// Teacher usernames and student ids live in separate namespaces, so `roles`
/// limits which sessions count as the same account.
pub async fn end_sessions_for(db: &impl ConnectionTrait, roles: &[Role], identity: &str) -> Result<u64> {
    let result = Session::delete_many()
        .filter(session::Column::Identity.eq(identity))
        .filter(session::Column::Role.is_in(roles.iter().copied()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Deletes all expired sessions, returning how many were removed.
pub async fn purge_expired_sessions(db: &DatabaseConnection) -> Result<u64> {
    let result = Session::delete_many()
        .filter(session::Column::ExpiresAt.lte(Utc::now()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn teacher_identity() -> Identity {
        Identity {
            role: Role::Teacher,
            identity: "mrsmith".to_string(),
        }
    }

    #[tokio::test]
    async fn test_session_roundtrip() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_session(&db, &teacher_identity(), 1).await?;

        let resolved = resolve_session(&db, &created.token).await?;
        assert_eq!(resolved, Some(teacher_identity()));

        end_session(&db, &created.token).await?;
        assert_eq!(resolve_session(&db, &created.token).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_session_does_not_resolve() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_session(&db, &teacher_identity(), -1).await?;

        assert_eq!(resolve_session(&db, &created.token).await?, None);
        assert!(Session::find_by_id(created.token).one(&db).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_purge_expired_sessions() -> Result<()> {
        let db = setup_test_db().await?;
        create_session(&db, &teacher_identity(), -1).await?;
        let live = create_session(&db, &teacher_identity(), 1).await?;

        assert_eq!(purge_expired_sessions(&db).await?, 1);
        assert!(resolve_session(&db, &live.token).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_end_sessions_for_identity() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_session(&db, &teacher_identity(), 1).await?;
        create_session(&db, &teacher_identity(), 1).await?;
        let student = create_session(
            &db,
            &Identity {
                role: Role::Student,
                identity: "mrsmith".to_string(),
            },
            1,
        )
        .await?;

        assert_eq!(end_sessions_for(&db, &[Role::Teacher], "mrsmith").await?, 2);
        assert!(resolve_session(&db, &first.token).await?.is_none());
        // A student who happens to share the id keeps their session.
        assert!(resolve_session(&db, &student.token).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_token() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(resolve_session(&db, "no-such-token").await?, None);
        end_session(&db, "no-such-token").await?;
        Ok(())
    }
}
