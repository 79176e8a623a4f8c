//! Tests for the credential service.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockCredentialHasher, MockSessionTokens, MockUserRepository};
use crate::domain::{
    ErrorCode, PasswordDigest, Role, SessionToken, UserAccount, UserId, Username,
};
use crate::test_support::MutableClock;

type Service = CredentialService<MockUserRepository, MockCredentialHasher, MockSessionTokens>;

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 9, 30, 0)
        .single()
        .expect("valid instant")
}

fn account(role: Role) -> UserAccount {
    UserAccount {
        user: User {
            id: UserId::new(3),
            username: Username::new("dora").expect("valid username"),
            email: None,
            role,
            created_at: Utc::now(),
        },
        password_digest: PasswordDigest::new("stored-digest"),
    }
}

fn caller() -> Caller {
    Caller {
        user_id: UserId::new(3),
        username: Username::new("dora").expect("valid username"),
        role: Role::User,
    }
}

fn service(
    users: MockUserRepository,
    hasher: MockCredentialHasher,
    tokens: MockSessionTokens,
    now: DateTime<Utc>,
) -> Service {
    CredentialService::new(
        Arc::new(users),
        Arc::new(hasher),
        Arc::new(tokens),
        Arc::new(MutableClock::new(now)),
    )
}

fn credentials(password: &str) -> LoginCredentials {
    LoginCredentials::try_from_parts("dora", password).expect("credentials shape")
}

#[rstest]
#[tokio::test]
async fn login_issues_token_with_ttl(now: DateTime<Utc>) {
    let mut users = MockUserRepository::new();
    users
        .expect_find_account_by_username()
        .withf(|username| username == "dora")
        .return_once(|_| Ok(Some(account(Role::Admin))));
    let mut hasher = MockCredentialHasher::new();
    hasher.expect_verify().return_const(true);
    let mut tokens = MockSessionTokens::new();
    tokens
        .expect_issue()
        .withf(move |claims| {
            claims.role == Role::Admin && claims.expires_at - claims.issued_at == TimeDelta::hours(DEFAULT_TOKEN_TTL_HOURS)
        })
        .return_once(|_| Ok(SessionToken::new("signed")));

    let outcome = service(users, hasher, tokens, now)
        .login(&credentials("secret"))
        .await
        .expect("login succeeds");

    assert_eq!(outcome.token.as_str(), "signed");
    assert_eq!(outcome.user.role, Role::Admin);
    assert_eq!(outcome.expires_at, now + TimeDelta::hours(DEFAULT_TOKEN_TTL_HOURS));
}

#[rstest]
#[case(None, false)]
#[case(Some(Role::User), false)]
#[tokio::test]
async fn unknown_user_and_wrong_password_fail_alike(
    now: DateTime<Utc>,
    #[case] stored: Option<Role>,
    #[case] password_matches: bool,
) {
    let mut users = MockUserRepository::new();
    users
        .expect_find_account_by_username()
        .return_once(move |_| Ok(stored.map(account)));
    let mut hasher = MockCredentialHasher::new();
    hasher.expect_verify().return_const(password_matches);

    let error = service(users, hasher, MockSessionTokens::new(), now)
        .login(&credentials("nope"))
        .await
        .expect_err("login rejected");

    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert_eq!(error.message(), "invalid credentials");
}

#[rstest]
#[tokio::test]
async fn change_password_requires_current_password(now: DateTime<Utc>) {
    let mut users = MockUserRepository::new();
    users
        .expect_find_account()
        .return_once(|_| Ok(Some(account(Role::User))));
    users.expect_update_password().never();
    let mut hasher = MockCredentialHasher::new();
    hasher.expect_verify().return_const(false);

    let replacement = NewPassword::new("brand-new").expect("valid password");
    let error = service(users, hasher, MockSessionTokens::new(), now)
        .change_password(&caller(), "wrong", &replacement)
        .await
        .expect_err("wrong current password");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn change_password_stores_new_digest(now: DateTime<Utc>) {
    let mut users = MockUserRepository::new();
    users
        .expect_find_account()
        .return_once(|_| Ok(Some(account(Role::User))));
    users
        .expect_update_password()
        .withf(|id, digest| *id == UserId::new(3) && digest.as_str() == "fresh-digest")
        .times(1)
        .return_once(|_, _| Ok(()));
    let mut hasher = MockCredentialHasher::new();
    hasher.expect_verify().return_const(true);
    hasher
        .expect_hash()
        .return_once(|_| Ok(PasswordDigest::new("fresh-digest")));

    let replacement = NewPassword::new("brand-new").expect("valid password");
    service(users, hasher, MockSessionTokens::new(), now)
        .change_password(&caller(), "old-secret", &replacement)
        .await
        .expect("password changed");
}

#[rstest]
#[tokio::test]
async fn current_user_reports_vanished_account(now: DateTime<Utc>) {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().return_once(|_| Ok(None));

    let error = service(
        users,
        MockCredentialHasher::new(),
        MockSessionTokens::new(),
        now,
    )
    .current_user(&caller())
    .await
    .expect_err("account gone");

    assert_eq!(error.code(), ErrorCode::NotFound);
}
