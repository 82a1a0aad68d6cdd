// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Unauthorized outcome handlers.
//!
//! When the enforcement middleware catches a member of the authorization error
//! family, the configured [`UnauthorizedHandler`] decides the HTTP outcome:
//! return a replacement response (typically a redirect to a login page), or
//! decline, in which case the original error response passes through
//! unchanged - the statically-typed equivalent of rethrowing.
//!
//! Handlers are looked up by name in an explicit [`HandlerRegistry`] built at
//! startup; applications register custom handlers under their own names.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::response::Response;
use http::header::{HeaderValue, LOCATION};
use http::{StatusCode, Uri};
use warden_core::{AuthzError, AuthzErrorKind};

/// Name of the built-in rethrow handler.
pub const EXCEPTION_HANDLER: &str = "exception";

/// Name of the built-in redirect handler.
pub const REDIRECT_HANDLER: &str = "redirect";

/// The request facts a handler may consult.
#[derive(Debug, Clone)]
pub struct RequestInfo {
	/// The originally-requested URI, captured before the downstream ran.
	pub uri: Uri,
}

impl RequestInfo {
	/// Path and query of the original request, used as the return target.
	pub fn target(&self) -> &str {
		self
			.uri
			.path_and_query()
			.map(|pq| pq.as_str())
			.unwrap_or("/")
	}
}

/// Configuration for unauthorized handlers.
///
/// Loaded once at middleware construction; immutable thereafter.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
	/// Redirect target: a literal path, or a route name for the
	/// route-resolving handler.
	pub url: String,
	/// Error kinds the handler claims; anything else is declined.
	pub exceptions: Vec<AuthzErrorKind>,
	/// Query parameter carrying the originally-requested URL, or `None` to
	/// omit it.
	pub query_param: Option<String>,
	/// Redirect status code.
	pub status_code: StatusCode,
}

impl Default for HandlerConfig {
	fn default() -> Self {
		Self {
			url: "/login".to_string(),
			exceptions: vec![AuthzErrorKind::MissingIdentity],
			query_param: Some("redirect".to_string()),
			status_code: StatusCode::FOUND,
		}
	}
}

impl HandlerConfig {
	/// Create the default configuration.
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the redirect target.
	pub fn with_url(mut self, url: impl Into<String>) -> Self {
		self.url = url.into();
		self
	}

	/// Set the claimed error kinds.
	pub fn with_exceptions(mut self, exceptions: Vec<AuthzErrorKind>) -> Self {
		self.exceptions = exceptions;
		self
	}

	/// Set the return-URL query parameter name.
	pub fn with_query_param(mut self, param: impl Into<String>) -> Self {
		self.query_param = Some(param.into());
		self
	}

	/// Omit the return-URL query parameter.
	pub fn without_query_param(mut self) -> Self {
		self.query_param = None;
		self
	}

	/// Set the redirect status code.
	pub fn with_status_code(mut self, status_code: StatusCode) -> Self {
		self.status_code = status_code;
		self
	}
}

/// Strategy turning a caught authorization failure into an HTTP outcome.
///
/// Returning `None` declines the failure; the original error response passes
/// through unchanged. Only members of the authorization error family are ever
/// offered to a handler.
pub trait UnauthorizedHandler: Send + Sync {
	fn handle(
		&self,
		error: &AuthzError,
		request: &RequestInfo,
		config: &HandlerConfig,
	) -> Option<Response>;
}

/// The default handler: declines everything, surfacing the original failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionHandler;

impl UnauthorizedHandler for ExceptionHandler {
	fn handle(
		&self,
		_error: &AuthzError,
		_request: &RequestInfo,
		_config: &HandlerConfig,
	) -> Option<Response> {
		None
	}
}

/// Redirects claimed failures to a literal URL, carrying the original request
/// target in a query parameter so the login flow can send the user back.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectHandler;

impl UnauthorizedHandler for RedirectHandler {
	fn handle(
		&self,
		error: &AuthzError,
		request: &RequestInfo,
		config: &HandlerConfig,
	) -> Option<Response> {
		if !config.exceptions.contains(&error.kind()) {
			return None;
		}
		redirect_response(&config.url, request, config)
	}
}

/// Resolves a route name to a concrete URL.
///
/// Collaborator contract for hosts with named routing; only the
/// route-resolving redirect handler uses it.
pub trait RouteResolver: Send + Sync {
	fn url_for(&self, name: &str) -> Option<String>;
}

/// Like [`RedirectHandler`], but `config.url` names a route resolved through
/// the host's [`RouteResolver`].
pub struct RouteRedirectHandler {
	routes: Arc<dyn RouteResolver>,
}

impl RouteRedirectHandler {
	/// Create a handler backed by the host's route resolver.
	pub fn new(routes: Arc<dyn RouteResolver>) -> Self {
		Self { routes }
	}
}

impl UnauthorizedHandler for RouteRedirectHandler {
	fn handle(
		&self,
		error: &AuthzError,
		request: &RequestInfo,
		config: &HandlerConfig,
	) -> Option<Response> {
		if !config.exceptions.contains(&error.kind()) {
			return None;
		}

		let Some(url) = self.routes.url_for(&config.url) else {
			tracing::error!(route = %config.url, "unauthorized redirect route did not resolve");
			return None;
		};
		redirect_response(&url, request, config)
	}
}

/// Build the redirect response, form-urlencoding the original request target
/// under the configured query parameter.
fn redirect_response(base: &str, request: &RequestInfo, config: &HandlerConfig) -> Option<Response> {
	let target = match &config.query_param {
		Some(param) => {
			let query = url::form_urlencoded::Serializer::new(String::new())
				.append_pair(param, request.target())
				.finish();
			let separator = if base.contains('?') { '&' } else { '?' };
			format!("{base}{separator}{query}")
		}
		None => base.to_string(),
	};

	// A config URL with bytes invalid in a header falls back to rethrow.
	let location = HeaderValue::from_str(&target).ok()?;

	let mut response = Response::new(Body::empty());
	*response.status_mut() = config.status_code;
	response.headers_mut().insert(LOCATION, location);
	Some(response)
}

/// Explicit name-to-handler registry, built at startup.
#[derive(Clone)]
pub struct HandlerRegistry {
	handlers: HashMap<String, Arc<dyn UnauthorizedHandler>>,
}

impl HandlerRegistry {
	/// Create an empty registry.
	pub fn empty() -> Self {
		Self {
			handlers: HashMap::new(),
		}
	}

	/// Register `handler` under `name`, replacing any previous entry.
	pub fn register(
		mut self,
		name: impl Into<String>,
		handler: impl UnauthorizedHandler + 'static,
	) -> Self {
		self.handlers.insert(name.into(), Arc::new(handler));
		self
	}

	/// Look up a handler by name.
	pub fn get(&self, name: &str) -> Option<Arc<dyn UnauthorizedHandler>> {
		self.handlers.get(name).cloned()
	}
}

impl Default for HandlerRegistry {
	/// The built-in handlers: [`EXCEPTION_HANDLER`] and [`REDIRECT_HANDLER`].
	fn default() -> Self {
		Self::empty()
			.register(EXCEPTION_HANDLER, ExceptionHandler)
			.register(REDIRECT_HANDLER, RedirectHandler)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn request(uri: &str) -> RequestInfo {
		RequestInfo {
			uri: uri.parse().unwrap(),
		}
	}

	fn missing_identity() -> AuthzError {
		AuthzError::MissingIdentity
	}

	fn forbidden() -> AuthzError {
		AuthzError::Forbidden {
			action: "edit".to_string(),
			resource: "Article",
		}
	}

	fn location(response: &Response) -> &str {
		response
			.headers()
			.get(LOCATION)
			.expect("redirect should carry a Location header")
			.to_str()
			.unwrap()
	}

	#[test]
	fn exception_handler_declines_everything() {
		let handler = ExceptionHandler;
		let config = HandlerConfig::default();

		assert!(handler
			.handle(&missing_identity(), &request("/secret"), &config)
			.is_none());
		assert!(handler
			.handle(&forbidden(), &request("/secret"), &config)
			.is_none());
	}

	#[test]
	fn redirect_handler_redirects_claimed_kind_with_return_url() {
		let handler = RedirectHandler;
		let config = HandlerConfig::default();

		let response = handler
			.handle(&missing_identity(), &request("/secret?x=1"), &config)
			.expect("missing identity is claimed by default");

		assert_eq!(response.status(), StatusCode::FOUND);
		assert_eq!(location(&response), "/login?redirect=%2Fsecret%3Fx%3D1");
	}

	#[test]
	fn redirect_handler_declines_unclaimed_kind() {
		let handler = RedirectHandler;
		let config = HandlerConfig::default();

		assert!(handler
			.handle(&forbidden(), &request("/secret?x=1"), &config)
			.is_none());
	}

	#[test]
	fn redirect_handler_honors_configured_kinds() {
		let handler = RedirectHandler;
		let config = HandlerConfig::default().with_exceptions(vec![
			AuthzErrorKind::MissingIdentity,
			AuthzErrorKind::Forbidden,
		]);

		assert!(handler
			.handle(&forbidden(), &request("/secret"), &config)
			.is_some());
	}

	#[test]
	fn redirect_without_query_param_uses_bare_url() {
		let handler = RedirectHandler;
		let config = HandlerConfig::default().without_query_param();

		let response = handler
			.handle(&missing_identity(), &request("/secret?x=1"), &config)
			.unwrap();
		assert_eq!(location(&response), "/login");
	}

	#[test]
	fn redirect_appends_to_existing_query() {
		let handler = RedirectHandler;
		let config = HandlerConfig::default().with_url("/login?from=app");

		let response = handler
			.handle(&missing_identity(), &request("/secret"), &config)
			.unwrap();
		assert_eq!(location(&response), "/login?from=app&redirect=%2Fsecret");
	}

	#[test]
	fn redirect_honors_status_code() {
		let handler = RedirectHandler;
		let config = HandlerConfig::default().with_status_code(StatusCode::SEE_OTHER);

		let response = handler
			.handle(&missing_identity(), &request("/secret"), &config)
			.unwrap();
		assert_eq!(response.status(), StatusCode::SEE_OTHER);
	}

	#[test]
	fn route_redirect_resolves_named_route() {
		struct StaticRoutes;

		impl RouteResolver for StaticRoutes {
			fn url_for(&self, name: &str) -> Option<String> {
				(name == "users:login").then(|| "/users/login".to_string())
			}
		}

		let handler = RouteRedirectHandler::new(Arc::new(StaticRoutes));
		let config = HandlerConfig::default().with_url("users:login");

		let response = handler
			.handle(&missing_identity(), &request("/secret"), &config)
			.unwrap();
		assert_eq!(location(&response), "/users/login?redirect=%2Fsecret");
	}

	#[test]
	fn route_redirect_declines_when_route_is_unknown() {
		struct NoRoutes;

		impl RouteResolver for NoRoutes {
			fn url_for(&self, _name: &str) -> Option<String> {
				None
			}
		}

		let handler = RouteRedirectHandler::new(Arc::new(NoRoutes));
		let config = HandlerConfig::default().with_url("users:login");

		assert!(handler
			.handle(&missing_identity(), &request("/secret"), &config)
			.is_none());
	}

	#[test]
	fn registry_default_has_builtins() {
		let registry = HandlerRegistry::default();

		assert!(registry.get(EXCEPTION_HANDLER).is_some());
		assert!(registry.get(REDIRECT_HANDLER).is_some());
		assert!(registry.get("custom").is_none());
	}

	#[test]
	fn registry_registers_custom_handlers() {
		struct Custom;

		impl UnauthorizedHandler for Custom {
			fn handle(
				&self,
				_error: &AuthzError,
				_request: &RequestInfo,
				_config: &HandlerConfig,
			) -> Option<Response> {
				Some(Response::new(Body::empty()))
			}
		}

		let registry = HandlerRegistry::default().register("custom", Custom);
		let handler = registry.get("custom").unwrap();

		assert!(handler
			.handle(
				&missing_identity(),
				&request("/"),
				&HandlerConfig::default()
			)
			.is_some());
	}

	mod property_tests {
		use super::*;
		use std::borrow::Cow;

		use proptest::prelude::*;

		proptest! {
			/// The return-URL parameter decodes back to the original target.
			#[test]
			fn return_url_roundtrips(path in "/[a-z]{1,8}(/[a-z]{1,8}){0,2}", key in "[a-z]{1,6}", value in "[a-z0-9]{0,6}") {
				let uri = format!("{path}?{key}={value}");
				let info = request(&uri);
				let config = HandlerConfig::default();

				let response = RedirectHandler
					.handle(&missing_identity(), &info, &config)
					.unwrap();
				let target = location(&response);
				let query = target.split('?').nth(1).unwrap();

				let decoded: Vec<(Cow<'_, str>, Cow<'_, str>)> =
					url::form_urlencoded::parse(query.as_bytes()).collect();
				prop_assert_eq!(decoded.len(), 1);
				prop_assert_eq!(decoded[0].0.as_ref(), "redirect");
				prop_assert_eq!(decoded[0].1.as_ref(), uri.as_str());
			}
		}
	}
}
