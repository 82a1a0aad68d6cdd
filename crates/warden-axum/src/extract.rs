// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Handler-side extractors for the authorization layer.
//!
//! [`Identity`] pulls the decorated identity the middleware placed in the
//! request extensions; a request without one rejects with the missing-identity
//! failure, which flows through the same unauthorized handler chain as an
//! in-handler denial. [`Authorization`] exposes the raw service for handlers
//! that need it without an identity, such as explicitly skipping the check.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use http::request::Parts;
use http::StatusCode;
use warden_core::{AuthorizationService, AuthzError, IdentityDecorator};

use crate::failure::AuthzFailure;

/// The authorization-capable identity for the current request.
///
/// ```ignore
/// async fn edit(Identity(user): Identity<User>) -> Result<(), AuthzFailure> {
///     user.authorize("edit", &article)?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity<I>(pub IdentityDecorator<I>);

impl<S, I> FromRequestParts<S> for Identity<I>
where
	S: Send + Sync,
	I: Clone + Send + Sync + 'static,
{
	type Rejection = AuthzFailure;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		parts
			.extensions
			.get::<IdentityDecorator<I>>()
			.cloned()
			.map(Identity)
			.ok_or(AuthzFailure(AuthzError::MissingIdentity))
	}
}

/// The per-request authorization service, independent of any identity.
#[derive(Debug, Clone)]
pub struct Authorization<I>(pub Arc<AuthorizationService<I>>);

impl<S, I> FromRequestParts<S> for Authorization<I>
where
	S: Send + Sync,
	I: Send + Sync + 'static,
{
	type Rejection = (StatusCode, &'static str);

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		parts
			.extensions
			.get::<Arc<AuthorizationService<I>>>()
			.cloned()
			.map(Authorization)
			.ok_or((
				StatusCode::INTERNAL_SERVER_ERROR,
				"authorization middleware is not installed",
			))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use warden_core::{AuthzErrorKind, MapResolver};

	#[derive(Debug, Clone, PartialEq)]
	struct User {
		id: u64,
	}

	fn service() -> Arc<AuthorizationService<User>> {
		Arc::new(AuthorizationService::new(Arc::new(
			MapResolver::<User>::new(),
		)))
	}

	#[tokio::test]
	async fn identity_extracts_the_decorator() {
		let request = http::Request::builder()
			.uri("/")
			.extension(IdentityDecorator::new(service(), User { id: 7 }))
			.body(())
			.unwrap();
		let (mut parts, _) = request.into_parts();

		let Identity(user) = Identity::<User>::from_request_parts(&mut parts, &())
			.await
			.expect("identity should be present");
		assert_eq!(user.id, 7);
	}

	#[tokio::test]
	async fn missing_identity_rejects_with_the_family_error() {
		let request = http::Request::builder().uri("/").body(()).unwrap();
		let (mut parts, _) = request.into_parts();

		let rejection = Identity::<User>::from_request_parts(&mut parts, &())
			.await
			.err()
			.expect("should reject");
		assert_eq!(rejection.0.kind(), AuthzErrorKind::MissingIdentity);
	}

	#[tokio::test]
	async fn authorization_extracts_the_service() {
		let request = http::Request::builder()
			.uri("/")
			.extension(service())
			.body(())
			.unwrap();
		let (mut parts, _) = request.into_parts();

		let Authorization(authz) = Authorization::<User>::from_request_parts(&mut parts, &())
			.await
			.expect("service should be present");
		assert!(!authz.authorization_checked());
	}

	#[tokio::test]
	async fn authorization_without_middleware_is_a_server_error() {
		let request = http::Request::builder().uri("/").body(()).unwrap();
		let (mut parts, _) = request.into_parts();

		let (status, _) = Authorization::<User>::from_request_parts(&mut parts, &())
			.await
			.err()
			.expect("should reject");
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	}
}
