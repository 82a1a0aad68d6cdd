// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the enforcement middleware.

use warden_core::IdentityBinding;

use crate::handlers::{HandlerConfig, HandlerRegistry, EXCEPTION_HANDLER};

/// Construction-time configuration for [`crate::AuthorizationLayer`].
///
/// `I` is the application identity type; it doubles as the request-extension
/// key the upstream authentication middleware stores the identity under.
pub struct AuthorizationConfig<I> {
	/// Enforce that requests carrying an identity exercised an authorization
	/// check before responding. Default: `true`.
	pub require_check: bool,
	/// Name of the unauthorized handler to dispatch caught failures to.
	/// Default: [`EXCEPTION_HANDLER`].
	pub handler: String,
	/// Configuration passed to the unauthorized handler.
	pub handler_config: HandlerConfig,
	/// Handler registry; the built-ins are pre-registered.
	pub registry: HandlerRegistry,
	/// How the bare identity becomes authorization-capable.
	pub binding: IdentityBinding<I>,
}

impl<I> AuthorizationConfig<I> {
	/// Create the default configuration: check required, rethrow handler,
	/// decorate binding.
	pub fn new() -> Self {
		Self {
			require_check: true,
			handler: EXCEPTION_HANDLER.to_string(),
			handler_config: HandlerConfig::default(),
			registry: HandlerRegistry::default(),
			binding: IdentityBinding::default(),
		}
	}

	/// Enable or disable the post-response check enforcement.
	pub fn with_require_check(mut self, require_check: bool) -> Self {
		self.require_check = require_check;
		self
	}

	/// Select the unauthorized handler and its configuration.
	pub fn with_handler(mut self, name: impl Into<String>, config: HandlerConfig) -> Self {
		self.handler = name.into();
		self.handler_config = config;
		self
	}

	/// Replace the handler registry.
	pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
		self.registry = registry;
		self
	}

	/// Set the identity binding.
	pub fn with_binding(mut self, binding: IdentityBinding<I>) -> Self {
		self.binding = binding;
		self
	}
}

impl<I> Default for AuthorizationConfig<I> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::handlers::REDIRECT_HANDLER;

	#[test]
	fn defaults_require_check_and_rethrow() {
		let config = AuthorizationConfig::<()>::new();

		assert!(config.require_check);
		assert_eq!(config.handler, EXCEPTION_HANDLER);
		assert!(config.registry.get(&config.handler).is_some());
	}

	#[test]
	fn builders_override_defaults() {
		let config = AuthorizationConfig::<()>::new()
			.with_require_check(false)
			.with_handler(REDIRECT_HANDLER, HandlerConfig::default().with_url("/signin"));

		assert!(!config.require_check);
		assert_eq!(config.handler, REDIRECT_HANDLER);
		assert_eq!(config.handler_config.url, "/signin");
	}
}
