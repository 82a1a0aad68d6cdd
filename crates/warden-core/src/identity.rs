// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity decoration.
//!
//! [`IdentityDecorator`] pairs the authenticated identity with the request's
//! [`AuthorizationService`] so call sites can ask `identity.can(...)` without
//! threading the service around. The decorator derefs to the wrapped identity,
//! so reads and calls against the identity's own surface keep working; code
//! that needs the concrete value takes it back with
//! [`IdentityDecorator::into_inner`].

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::Result;
use crate::policy::Resource;
use crate::service::AuthorizationService;

/// The authenticated identity decorated with authorization capabilities.
///
/// Created by the enforcement middleware once per request, immediately after
/// authentication; its lifetime equals the request's.
pub struct IdentityDecorator<I> {
	identity: I,
	service: Arc<AuthorizationService<I>>,
}

impl<I> IdentityDecorator<I> {
	/// Wrap `identity` with the request's authorization service.
	pub fn new(service: Arc<AuthorizationService<I>>, identity: I) -> Self {
		Self { identity, service }
	}

	/// Decide whether this identity may perform `action` on `resource`.
	pub fn can(&self, action: &str, resource: &dyn Resource) -> Result<bool> {
		self.service.can(&self.identity, action, resource)
	}

	/// Like [`IdentityDecorator::can`], but fails with
	/// [`crate::AuthzError::Forbidden`] on denial.
	pub fn authorize(&self, action: &str, resource: &dyn Resource) -> Result<()> {
		self.service.authorize(&self.identity, action, resource)
	}

	/// Narrow `resource` to what this identity may see for `action`.
	pub fn apply_scope(&self, action: &str, resource: Box<dyn Resource>) -> Result<Box<dyn Resource>> {
		self.service.apply_scope(&self.identity, action, resource)
	}

	/// The authorization service bound to this request.
	pub fn service(&self) -> &Arc<AuthorizationService<I>> {
		&self.service
	}

	/// Borrow the wrapped identity.
	pub fn inner(&self) -> &I {
		&self.identity
	}

	/// Unwrap, returning the exact original identity value.
	pub fn into_inner(self) -> I {
		self.identity
	}
}

impl<I> Deref for IdentityDecorator<I> {
	type Target = I;

	fn deref(&self) -> &I {
		&self.identity
	}
}

impl<I: Clone> Clone for IdentityDecorator<I> {
	fn clone(&self) -> Self {
		Self {
			identity: self.identity.clone(),
			service: self.service.clone(),
		}
	}
}

impl<I: fmt::Debug> fmt::Debug for IdentityDecorator<I> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("IdentityDecorator")
			.field("identity", &self.identity)
			.finish_non_exhaustive()
	}
}

/// How the middleware turns the bare identity into an authorization-capable
/// one.
pub enum IdentityBinding<I> {
	/// Wrap the identity in an [`IdentityDecorator`] (the default).
	Decorate,
	/// Application-supplied binding for identity types that carry their own
	/// authorization surface: receives the request's service and the bare
	/// identity, returns the capable identity to attach.
	Bind(Arc<dyn Fn(Arc<AuthorizationService<I>>, I) -> I + Send + Sync>),
}

impl<I> IdentityBinding<I> {
	/// Build a [`IdentityBinding::Bind`] from a closure.
	pub fn bind(
		bind: impl Fn(Arc<AuthorizationService<I>>, I) -> I + Send + Sync + 'static,
	) -> Self {
		IdentityBinding::Bind(Arc::new(bind))
	}
}

impl<I> Default for IdentityBinding<I> {
	fn default() -> Self {
		IdentityBinding::Decorate
	}
}

impl<I> Clone for IdentityBinding<I> {
	fn clone(&self) -> Self {
		match self {
			IdentityBinding::Decorate => IdentityBinding::Decorate,
			IdentityBinding::Bind(bind) => IdentityBinding::Bind(bind.clone()),
		}
	}
}

impl<I> fmt::Debug for IdentityBinding<I> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			IdentityBinding::Decorate => f.write_str("Decorate"),
			IdentityBinding::Bind(_) => f.write_str("Bind(..)"),
		}
	}
}
