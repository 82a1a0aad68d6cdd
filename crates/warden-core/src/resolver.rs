// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy resolution strategies.
//!
//! A [`PolicyResolver`] locates the [`Policy`] responsible for a resource.
//! Resolution is an explicit registry keyed on the resource's concrete type:
//!
//! - [`MapResolver`] - a `TypeId -> policy` map built at startup
//! - [`CompositeResolver`] - tries sub-resolvers in order, first success wins
//!
//! Resolvers are immutable after construction and shared across requests via
//! `Arc`, so concurrent lookups need no synchronization.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AuthzError, Result};
use crate::policy::{Policy, Resource};

/// Locates the policy responsible for a resource.
///
/// Must be deterministic for a given resource type within one request and must
/// have no side effects beyond internal caching.
pub trait PolicyResolver<I>: Send + Sync {
	/// Resolve the policy for `resource`, or fail with
	/// [`AuthzError::PolicyNotFound`].
	fn resolve(&self, resource: &dyn Resource) -> Result<Arc<dyn Policy<I>>>;
}

/// Map-based resolver: one policy per registered resource type.
pub struct MapResolver<I> {
	policies: HashMap<TypeId, Arc<dyn Policy<I>>>,
}

impl<I> MapResolver<I> {
	/// Create an empty resolver.
	pub fn new() -> Self {
		Self {
			policies: HashMap::new(),
		}
	}

	/// Register `policy` for resource type `R`.
	pub fn register<R: Any>(mut self, policy: impl Policy<I> + 'static) -> Self {
		self.policies.insert(TypeId::of::<R>(), Arc::new(policy));
		self
	}

	/// Register an already-shared policy for resource type `R`.
	pub fn register_arc<R: Any>(mut self, policy: Arc<dyn Policy<I>>) -> Self {
		self.policies.insert(TypeId::of::<R>(), policy);
		self
	}

	/// Number of registered policies.
	pub fn len(&self) -> usize {
		self.policies.len()
	}

	/// Returns true if no policies are registered.
	pub fn is_empty(&self) -> bool {
		self.policies.is_empty()
	}
}

impl<I> Default for MapResolver<I> {
	fn default() -> Self {
		Self::new()
	}
}

impl<I> PolicyResolver<I> for MapResolver<I> {
	fn resolve(&self, resource: &dyn Resource) -> Result<Arc<dyn Policy<I>>> {
		self
			.policies
			.get(&resource.as_any().type_id())
			.cloned()
			.ok_or(AuthzError::PolicyNotFound {
				resource: resource.resource_name(),
			})
	}
}

/// Chained resolver: tries each sub-resolver in configured order.
///
/// Returns the first successful resolution; if every sub-resolver fails, the
/// last failure propagates.
pub struct CompositeResolver<I> {
	resolvers: Vec<Arc<dyn PolicyResolver<I>>>,
}

impl<I> CompositeResolver<I> {
	/// Create an empty composite.
	pub fn new() -> Self {
		Self {
			resolvers: Vec::new(),
		}
	}

	/// Append a sub-resolver, tried after all previously added ones.
	pub fn with(mut self, resolver: impl PolicyResolver<I> + 'static) -> Self {
		self.resolvers.push(Arc::new(resolver));
		self
	}

	/// Append an already-shared sub-resolver.
	pub fn with_arc(mut self, resolver: Arc<dyn PolicyResolver<I>>) -> Self {
		self.resolvers.push(resolver);
		self
	}
}

impl<I> Default for CompositeResolver<I> {
	fn default() -> Self {
		Self::new()
	}
}

impl<I> PolicyResolver<I> for CompositeResolver<I> {
	fn resolve(&self, resource: &dyn Resource) -> Result<Arc<dyn Policy<I>>> {
		let mut last = AuthzError::PolicyNotFound {
			resource: resource.resource_name(),
		};

		for resolver in &self.resolvers {
			match resolver.resolve(resource) {
				Ok(policy) => return Ok(policy),
				Err(error) => last = error,
			}
		}

		Err(last)
	}
}
