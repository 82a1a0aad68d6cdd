// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Response conversion for the authorization error family.
//!
//! Axum handlers have no exception unwinding, so an authorization failure
//! travels as a response: [`AuthzFailure`] renders the error and stashes a
//! typed copy in the response extensions, where the enforcement middleware
//! picks it up and offers it to the configured unauthorized handler. Error
//! responses produced any other way carry no such extension and bypass the
//! handler chain entirely.
//!
//! Client-facing messages stay generic; permission detail beyond
//! "Insufficient permissions" is never leaked.

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::Serialize;
use warden_core::{AuthzError, AuthzErrorKind};

/// JSON error body, matching the host API's error envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
	/// Stable error code (the failure's kind in snake_case).
	pub error: String,
	/// Human-readable message.
	pub message: String,
}

/// An authorization failure on its way out of a handler.
///
/// Handlers return `Result<_, AuthzFailure>` and use `?` on decision methods;
/// the `From<AuthzError>` impl keeps the family intact across the boundary.
#[derive(Debug, Clone)]
pub struct AuthzFailure(pub AuthzError);

impl From<AuthzError> for AuthzFailure {
	fn from(error: AuthzError) -> Self {
		AuthzFailure(error)
	}
}

impl std::fmt::Display for AuthzFailure {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.0.fmt(f)
	}
}

impl std::error::Error for AuthzFailure {}

/// HTTP status for a member of the error family.
///
/// Identity and denial failures map to their conventional statuses; the rest
/// (unresolvable policies, missing capabilities, skipped checks) are server
/// misconfiguration or development-time failures.
pub fn status_for(kind: AuthzErrorKind) -> StatusCode {
	match kind {
		AuthzErrorKind::MissingIdentity => StatusCode::UNAUTHORIZED,
		AuthzErrorKind::Forbidden => StatusCode::FORBIDDEN,
		AuthzErrorKind::PolicyNotFound
		| AuthzErrorKind::MissingMethod
		| AuthzErrorKind::CheckRequired
		| AuthzErrorKind::Policy => StatusCode::INTERNAL_SERVER_ERROR,
	}
}

impl IntoResponse for AuthzFailure {
	fn into_response(self) -> Response {
		let kind = self.0.kind();
		let message = match kind {
			AuthzErrorKind::MissingIdentity => "Authentication required".to_string(),
			AuthzErrorKind::Forbidden => "Insufficient permissions".to_string(),
			// Server-side failures are developer-facing; keep the detail.
			_ => self.0.to_string(),
		};

		let mut response = (
			status_for(kind),
			Json(ErrorResponse {
				error: kind.as_str().to_string(),
				message,
			}),
		)
			.into_response();
		response.extensions_mut().insert(self.0);
		response
	}
}
