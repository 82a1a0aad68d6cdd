// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The policy contract: resources and the capability set applications supply.
//!
//! A [`Policy`] decides whether an identity may perform an action on a
//! resource, and may optionally narrow a resource to what the identity is
//! allowed to see. Policies are pure application code; the pipeline only
//! defines the contract and routes decisions to them.

use std::any::Any;

use crate::error::{AuthzError, Result};

/// A value the authorization pipeline can route decisions for.
///
/// Blanket-implemented for every `'static` `Send + Sync` type, so application
/// entities participate without ceremony. Resolution is keyed on the concrete
/// [`std::any::TypeId`] reached through [`Resource::as_any`];
/// [`Resource::resource_name`] exists only for diagnostics and error messages.
pub trait Resource: Any + Send + Sync {
	/// Diagnostic name of the concrete type.
	fn resource_name(&self) -> &'static str;

	/// Borrow as [`Any`] for downcasting.
	fn as_any(&self) -> &dyn Any;

	/// Convert into [`Any`] for downcasting owned values (scoped results).
	fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> Resource for T {
	fn resource_name(&self) -> &'static str {
		std::any::type_name::<T>()
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
		self
	}
}

impl dyn Resource {
	/// Returns true if the concrete resource type is `T`.
	pub fn is<T: Any>(&self) -> bool {
		self.as_any().is::<T>()
	}

	/// Downcast to a concrete resource type.
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.as_any().downcast_ref::<T>()
	}
}

/// The capability set a policy exposes for one resource type.
///
/// `I` is the application's identity type; the pipeline never inspects it
/// beyond handing it to policies by reference.
///
/// Implementations must be deterministic for a given identity, action, and
/// resource within one request, and must not have side effects.
pub trait Policy<I>: Send + Sync {
	/// Decide whether `identity` may perform `action` on `resource`.
	///
	/// Returning `Ok(false)` is an ordinary denial; `Err` is reserved for
	/// evaluation failures, which propagate to the caller unchanged.
	fn can(&self, identity: &I, action: &str, resource: &dyn Resource) -> Result<bool>;

	/// Narrow `resource` to what `identity` may see for `action`.
	///
	/// Scoping is optional; the provided default reports the policy as not
	/// implementing it.
	fn scope(
		&self,
		_identity: &I,
		_action: &str,
		resource: Box<dyn Resource>,
	) -> Result<Box<dyn Resource>> {
		Err(AuthzError::MissingMethod {
			resource: resource.resource_name(),
			method: "scope",
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Article {
		author: u64,
	}

	struct Viewer;

	struct ReadOnlyPolicy;

	impl Policy<Viewer> for ReadOnlyPolicy {
		fn can(&self, _identity: &Viewer, action: &str, _resource: &dyn Resource) -> Result<bool> {
			Ok(action == "view")
		}
	}

	#[test]
	fn resource_downcasts_to_concrete_type() {
		let article = Article { author: 42 };
		let resource: &dyn Resource = &article;

		assert!(resource.is::<Article>());
		assert!(!resource.is::<Viewer>());
		assert_eq!(resource.downcast_ref::<Article>().unwrap().author, 42);
	}

	#[test]
	fn erased_resource_reports_its_concrete_type_id() {
		let resource: &dyn Resource = &Article { author: 1 };
		assert_eq!(
			resource.as_any().type_id(),
			std::any::TypeId::of::<Article>()
		);
	}

	#[test]
	fn resource_name_is_the_concrete_type_name() {
		let resource: &dyn Resource = &Article { author: 1 };
		assert!(resource.resource_name().ends_with("Article"));
	}

	#[test]
	fn owned_resource_downcasts_through_into_any() {
		let boxed: Box<dyn Resource> = Box::new(Article { author: 7 });
		let article = boxed.into_any().downcast::<Article>().unwrap();
		assert_eq!(article.author, 7);
	}

	#[test]
	fn default_scope_reports_missing_method() {
		let policy = ReadOnlyPolicy;
		let error = policy
			.scope(&Viewer, "view", Box::new(Article { author: 1 }))
			.err()
			.expect("default scope should fail");

		match error {
			AuthzError::MissingMethod { method, .. } => assert_eq!(method, "scope"),
			other => panic!("expected MissingMethod, got {other:?}"),
		}
	}
}
