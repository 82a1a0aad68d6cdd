// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The request-scoped authorization service.
//!
//! One [`AuthorizationService`] exists per request. It resolves policies,
//! delegates decisions, and tracks whether any decision method ran so the
//! enforcement middleware can tell "authorization was considered" apart from
//! "authorization was skipped".
//!
//! # Check recording
//!
//! The `checked` flag is recorded as its own unconditional step, after the
//! policy resolves and strictly before the decision result is observable to
//! the caller. A denial records the check. A policy failure records the check.
//! Only a resolution failure does not, because no policy was ever asked. The
//! flag is monotonic for the life of the request and is never reset.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::instrument;

use crate::error::{AuthzError, Result};
use crate::policy::Resource;
use crate::resolver::PolicyResolver;

/// Orchestrates policy resolution and decision dispatch for one request.
pub struct AuthorizationService<I> {
	resolver: Arc<dyn PolicyResolver<I>>,
	checked: AtomicBool,
}

impl<I> AuthorizationService<I> {
	/// Create a service backed by `resolver`.
	///
	/// The middleware creates one per request; the resolver is shared across
	/// requests and must stay immutable.
	pub fn new(resolver: Arc<dyn PolicyResolver<I>>) -> Self {
		Self {
			resolver,
			checked: AtomicBool::new(false),
		}
	}

	/// Decide whether `identity` may perform `action` on `resource`.
	///
	/// Fails with [`AuthzError::PolicyNotFound`] when resolution fails;
	/// policy evaluation failures propagate unchanged.
	#[instrument(level = "debug", skip_all, fields(action = %action, resource = resource.resource_name()))]
	pub fn can(&self, identity: &I, action: &str, resource: &dyn Resource) -> Result<bool> {
		let policy = self.resolver.resolve(resource)?;
		self.record_check();

		let decision = policy.can(identity, action, resource);
		match &decision {
			Ok(allowed) => tracing::debug!(allowed, "authorization decision"),
			Err(error) => tracing::debug!(error = %error, "policy evaluation failed"),
		}
		decision
	}

	/// Narrow `resource` to what `identity` may see for `action`.
	///
	/// Fails with [`AuthzError::MissingMethod`] when the resolved policy does
	/// not implement scoping, or [`AuthzError::PolicyNotFound`] on resolution
	/// failure.
	#[instrument(level = "debug", skip_all, fields(action = %action, resource = resource.resource_name()))]
	pub fn apply_scope(
		&self,
		identity: &I,
		action: &str,
		resource: Box<dyn Resource>,
	) -> Result<Box<dyn Resource>> {
		let policy = self.resolver.resolve(resource.as_ref())?;
		self.record_check();

		policy.scope(identity, action, resource)
	}

	/// Like [`AuthorizationService::can`], but fails with
	/// [`AuthzError::Forbidden`] when the decision denies the action.
	pub fn authorize(&self, identity: &I, action: &str, resource: &dyn Resource) -> Result<()> {
		if self.can(identity, action, resource)? {
			Ok(())
		} else {
			tracing::info!(
				action = %action,
				resource = resource.resource_name(),
				"authorization denied"
			);
			Err(AuthzError::Forbidden {
				action: action.to_string(),
				resource: resource.resource_name(),
			})
		}
	}

	/// Mark the request as checked without making a decision.
	///
	/// The explicit bypass for endpoints that intentionally perform no
	/// authorization while check enforcement is enabled.
	pub fn skip_authorization(&self) {
		tracing::debug!("authorization check explicitly skipped");
		self.record_check();
	}

	/// Whether any decision method ran (or the check was explicitly skipped)
	/// during this request. Read by the enforcement middleware only.
	pub fn authorization_checked(&self) -> bool {
		self.checked.load(Ordering::Acquire)
	}

	fn record_check(&self) {
		self.checked.store(true, Ordering::Release);
	}
}

impl<I> fmt::Debug for AuthorizationService<I> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AuthorizationService")
			.field("checked", &self.authorization_checked())
			.finish_non_exhaustive()
	}
}
