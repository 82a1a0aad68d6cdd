// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authorization error family.
//!
//! Every failure the decision pipeline can produce is a member of
//! [`AuthzError`]. Middleware matches caught failures against this family and
//! only this family; anything else is not authorization's concern and must
//! propagate untouched.
//!
//! [`AuthzErrorKind`] is the data-only discriminant used by unauthorized
//! handlers to decide whether they claim a failure (for example, a redirect
//! handler configured to act on `missing_identity` only).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for authorization operations.
pub type Result<T> = std::result::Result<T, AuthzError>;

/// Errors produced by the authorization decision pipeline.
///
/// The family is `Clone` so a failure can be carried alongside the response it
/// produced (middleware inspects it on the way out of the pipeline).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
	/// No policy is registered for the resource.
	#[error("no policy resolved for resource `{resource}`")]
	PolicyNotFound {
		/// Diagnostic name of the resource type.
		resource: &'static str,
	},

	/// The resolved policy does not implement a capability the call requires.
	#[error("policy for `{resource}` does not implement `{method}`")]
	MissingMethod {
		resource: &'static str,
		method: &'static str,
	},

	/// A decision explicitly denied the action.
	#[error("not allowed to `{action}` on `{resource}`")]
	Forbidden {
		action: String,
		resource: &'static str,
	},

	/// An operation required an identity but none was present.
	#[error("an identity is required but none was present")]
	MissingIdentity,

	/// A request that required an authorization check completed without one.
	///
	/// Raised only by the enforcement middleware, never by application code.
	#[error("the request completed without an authorization check")]
	CheckRequired,

	/// An application policy failed while evaluating a decision.
	#[error("policy evaluation failed: {0}")]
	Policy(String),
}

impl AuthzError {
	/// Wrap an application policy failure so it stays inside the family.
	pub fn policy(message: impl std::fmt::Display) -> Self {
		AuthzError::Policy(message.to_string())
	}

	/// The data-only discriminant for this error, used for handler matching.
	pub fn kind(&self) -> AuthzErrorKind {
		match self {
			AuthzError::PolicyNotFound { .. } => AuthzErrorKind::PolicyNotFound,
			AuthzError::MissingMethod { .. } => AuthzErrorKind::MissingMethod,
			AuthzError::Forbidden { .. } => AuthzErrorKind::Forbidden,
			AuthzError::MissingIdentity => AuthzErrorKind::MissingIdentity,
			AuthzError::CheckRequired => AuthzErrorKind::CheckRequired,
			AuthzError::Policy(_) => AuthzErrorKind::Policy,
		}
	}
}

/// Discriminants of the authorization error family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthzErrorKind {
	PolicyNotFound,
	MissingMethod,
	Forbidden,
	MissingIdentity,
	CheckRequired,
	Policy,
}

impl AuthzErrorKind {
	/// Stable snake_case name, matching the serde representation.
	pub fn as_str(&self) -> &'static str {
		match self {
			AuthzErrorKind::PolicyNotFound => "policy_not_found",
			AuthzErrorKind::MissingMethod => "missing_method",
			AuthzErrorKind::Forbidden => "forbidden",
			AuthzErrorKind::MissingIdentity => "missing_identity",
			AuthzErrorKind::CheckRequired => "check_required",
			AuthzErrorKind::Policy => "policy",
		}
	}
}
