use shopdeploy_api::domain::types::{SavedAddress, User};
use shopdeploy_api::error::ApiError;
use shopdeploy_api::usecase::auth::{
    AuthOutput, GetMeUseCase, LoginInput, LoginUseCase, LogoutUseCase, RefreshTokenUseCase,
    RegisterInput, RegisterUseCase, ReplaceAddressesUseCase, validate_refresh_token,
};
use shopdeploy_auth_types::token::validate_access_token;
use shopdeploy_domain::id::UserId;
use shopdeploy_domain::user::UserRole;
use shopdeploy_testing::auth::{TEST_ACCESS_SECRET, TEST_REFRESH_SECRET};

use crate::helpers::{InMemoryStore, test_address, test_secrets};

async fn register(store: &InMemoryStore, email: &str) -> AuthOutput {
    RegisterUseCase {
        users: store.clone(),
        secrets: test_secrets(),
    }
    .execute(RegisterInput {
        name: "Asha".into(),
        email: email.into(),
        password: "hunter22".into(),
    })
    .await
    .unwrap()
}

async fn login(store: &InMemoryStore, email: &str, password: &str) -> Result<AuthOutput, ApiError> {
    LoginUseCase {
        users: store.clone(),
        secrets: test_secrets(),
    }
    .execute(LoginInput {
        email: email.into(),
        password: password.into(),
    })
    .await
}

fn stored_user(store: &InMemoryStore, id: UserId) -> User {
    store.with(|s| s.users.iter().find(|u| u.id == id).cloned().unwrap())
}

// ── Register / Login ─────────────────────────────────────────────────────────

#[tokio::test]
async fn should_register_customer_with_hashed_password_and_session() {
    let store = InMemoryStore::new();

    let out = register(&store, "  Asha@Example.com ").await;

    assert_eq!(out.user.email, "asha@example.com");
    assert_eq!(out.user.role, UserRole::Customer);
    let user = stored_user(&store, out.user.id);
    assert_ne!(user.password_hash, "hunter22");
    assert_eq!(user.refresh_token.as_deref(), Some(out.refresh_token.as_str()));

    let info = validate_access_token(&out.access_token, TEST_ACCESS_SECRET).unwrap();
    assert_eq!(info.user_id, out.user.id);
    assert_eq!(
        validate_refresh_token(&out.refresh_token, TEST_REFRESH_SECRET).unwrap(),
        out.user.id
    );
}

#[tokio::test]
async fn should_reject_duplicate_email() {
    let store = InMemoryStore::new();
    register(&store, "asha@example.com").await;

    let result = RegisterUseCase {
        users: store.clone(),
        secrets: test_secrets(),
    }
    .execute(RegisterInput {
        name: "Other".into(),
        email: "ASHA@example.com".into(),
        password: "password1".into(),
    })
    .await;

    assert!(
        matches!(result, Err(ApiError::UserAlreadyExists)),
        "expected UserAlreadyExists, got {result:?}"
    );
}

#[tokio::test]
async fn should_validate_registration_fields() {
    let store = InMemoryStore::new();
    let usecase = RegisterUseCase {
        users: store.clone(),
        secrets: test_secrets(),
    };

    for (name, email, password) in [
        ("", "a@b.co", "secret1"),
        ("A", "not-an-email", "secret1"),
        ("A", "a@b.co", "short"),
    ] {
        let result = usecase
            .execute(RegisterInput {
                name: name.into(),
                email: email.into(),
                password: password.into(),
            })
            .await;
        assert!(
            matches!(result, Err(ApiError::Validation(_))),
            "expected Validation for {email:?}, got {result:?}"
        );
    }
    assert!(store.with(|s| s.users.is_empty()));
}

#[tokio::test]
async fn should_fail_login_identically_for_unknown_email_and_wrong_password() {
    let store = InMemoryStore::new();
    register(&store, "asha@example.com").await;

    let wrong_password = login(&store, "asha@example.com", "nope-nope").await;
    let unknown_email = login(&store, "nobody@example.com", "hunter22").await;

    assert!(
        matches!(wrong_password, Err(ApiError::InvalidCredentials)),
        "expected InvalidCredentials, got {wrong_password:?}"
    );
    assert!(
        matches!(unknown_email, Err(ApiError::InvalidCredentials)),
        "expected InvalidCredentials, got {unknown_email:?}"
    );
}

// ── Refresh / Logout ─────────────────────────────────────────────────────────

#[tokio::test]
async fn should_rotate_refresh_token() {
    let store = InMemoryStore::new();
    let first = register(&store, "asha@example.com").await;
    let usecase = RefreshTokenUseCase {
        users: store.clone(),
        secrets: test_secrets(),
    };

    let second = usecase.execute(&first.refresh_token).await.unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);

    let reused = usecase.execute(&first.refresh_token).await;
    assert!(
        matches!(reused, Err(ApiError::InvalidRefreshToken)),
        "expected InvalidRefreshToken, got {reused:?}"
    );
    assert!(usecase.execute(&second.refresh_token).await.is_ok());
}

#[tokio::test]
async fn should_invalidate_previous_session_on_new_login() {
    let store = InMemoryStore::new();
    let first = register(&store, "asha@example.com").await;
    login(&store, "asha@example.com", "hunter22").await.unwrap();

    let result = RefreshTokenUseCase {
        users: store.clone(),
        secrets: test_secrets(),
    }
    .execute(&first.refresh_token)
    .await;

    assert!(
        matches!(result, Err(ApiError::InvalidRefreshToken)),
        "expected InvalidRefreshToken, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_refresh_after_logout() {
    let store = InMemoryStore::new();
    let out = register(&store, "asha@example.com").await;

    LogoutUseCase {
        users: store.clone(),
    }
    .execute(out.user.id)
    .await
    .unwrap();

    assert_eq!(stored_user(&store, out.user.id).refresh_token, None);
    let result = RefreshTokenUseCase {
        users: store.clone(),
        secrets: test_secrets(),
    }
    .execute(&out.refresh_token)
    .await;
    assert!(
        matches!(result, Err(ApiError::InvalidRefreshToken)),
        "expected InvalidRefreshToken, got {result:?}"
    );
}

// ── Me / addresses ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_return_not_found_for_deleted_user() {
    let result = GetMeUseCase {
        users: InMemoryStore::new(),
    }
    .execute(UserId::new())
    .await;

    assert!(
        matches!(result, Err(ApiError::UserNotFound)),
        "expected UserNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_allow_at_most_one_default_address() {
    let store = InMemoryStore::new();
    let out = register(&store, "asha@example.com").await;
    let usecase = ReplaceAddressesUseCase {
        users: store.clone(),
    };
    let saved = |is_default| SavedAddress {
        address: test_address(),
        is_default,
    };

    let result = usecase
        .execute(out.user.id, vec![saved(true), saved(true)])
        .await;
    assert!(
        matches!(result, Err(ApiError::Validation(_))),
        "expected Validation, got {result:?}"
    );

    let user = usecase
        .execute(out.user.id, vec![saved(true), saved(false)])
        .await
        .unwrap();
    assert_eq!(user.addresses.len(), 2);
    assert_eq!(stored_user(&store, out.user.id).addresses.len(), 2);
}
