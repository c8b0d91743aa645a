use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::db::entities::prelude::*;
use crate::db::entities::user;
use crate::error::{AppError, Result};
use crate::services::security::verify_password;

/// True if at least one user exists in the database.
///
/// Gates the one-time initial-setup flow: an empty user table is a fairly
/// good sign the app is being run for the first time.
pub async fn users_exist(db: &DatabaseConnection) -> Result<bool> {
    let any = User::find().one(db).await?;
    Ok(any.is_some())
}

/// Verify an operator's credentials.
///
/// Fails with `UnknownIdentity` when no user matches the email,
/// `InvalidCredential` when the password check fails (including users with
/// no password set), and `InactiveAccount` when the matched user is not
/// active.
pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<user::Model> {
    let user = User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?
        .ok_or(AppError::UnknownIdentity)?;

    if !verify_password(password, user.hashed_password.as_deref()) {
        return Err(AppError::InvalidCredential);
    }

    if !user.active {
        return Err(AppError::InactiveAccount);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{create_test_db, create_test_user};

    #[tokio::test]
    async fn test_users_exist() {
        let db = create_test_db().await;
        assert!(!users_exist(&db).await.unwrap());

        create_test_user(&db, "foo@bar.com", Some("foobarbaz123"), true).await;
        assert!(users_exist(&db).await.unwrap());
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let db = create_test_db().await;
        create_test_user(&db, "foo@bar.com", Some("foobarbaz123"), true).await;

        let user = authenticate(&db, "foo@bar.com", "foobarbaz123")
            .await
            .unwrap();
        assert_eq!(user.email, "foo@bar.com");
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let db = create_test_db().await;

        let err = authenticate(&db, "nobody@bar.com", "whatever")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownIdentity));
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let db = create_test_db().await;
        create_test_user(&db, "foo@bar.com", Some("foobarbaz123"), true).await;

        let err = authenticate(&db, "foo@bar.com", "barfoobaz").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_authenticate_user_without_password() {
        let db = create_test_db().await;
        create_test_user(&db, "foo@bar.com", None, true).await;

        let err = authenticate(&db, "foo@bar.com", "anything").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_authenticate_inactive_account() {
        let db = create_test_db().await;
        create_test_user(&db, "foo@bar.com", Some("foobarbaz123"), false).await;

        let err = authenticate(&db, "foo@bar.com", "foobarbaz123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InactiveAccount));
    }
}
