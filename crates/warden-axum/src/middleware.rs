// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authorization check-enforcement layer.
//!
//! Per request, the layer obtains an [`AuthorizationService`] from the host's
//! [`AuthorizationProvider`] factory, decorates the identity found in the
//! request extensions, runs the downstream, and on the way back:
//!
//! - routes any surfaced authorization failure through the configured
//!   unauthorized handler;
//! - raises [`AuthzError::CheckRequired`] when a request that carried an
//!   identity completed without exercising a single authorization decision
//!   (unless enforcement is disabled or the check was explicitly skipped).
//!
//! Enforcement is detective, not preventive: it runs after the downstream
//! completed, so it cannot undo work unauthorized code already did. It is a
//! development and testing safety net, not a security boundary on its own.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use http::Request;
use pin_project_lite::pin_project;
use tower::{Layer, Service};
use warden_core::{AuthorizationService, AuthzError, IdentityBinding, IdentityDecorator};

use crate::config::AuthorizationConfig;
use crate::failure::AuthzFailure;
use crate::handlers::RequestInfo;

/// Host-application factory producing the per-request authorization service.
///
/// Invoked once per request before the downstream runs. A failure here
/// short-circuits the request.
pub trait AuthorizationProvider<I>: Send + Sync {
	fn authorization(
		&self,
		request: &Request<Body>,
	) -> warden_core::Result<Arc<AuthorizationService<I>>>;
}

impl<I, F> AuthorizationProvider<I> for F
where
	F: Fn(&Request<Body>) -> warden_core::Result<Arc<AuthorizationService<I>>> + Send + Sync,
{
	fn authorization(
		&self,
		request: &Request<Body>,
	) -> warden_core::Result<Arc<AuthorizationService<I>>> {
		self(request)
	}
}

/// Tower layer installing [`AuthorizationMiddleware`].
///
/// The identity type `I` is also the request-extension key under which the
/// upstream authentication middleware stored the identity; this layer reads
/// and replaces that key.
///
/// Check enforcement applies to successful responses only. Any 4xx/5xx
/// response that does not carry a member of the authorization error family is
/// treated as a failure outside this layer's concern and passes through,
/// which covers router-generated 404/405s but also means a handler that
/// deliberately answers with an error status is never asked whether it
/// checked.
pub struct AuthorizationLayer<I> {
	provider: Arc<dyn AuthorizationProvider<I>>,
	config: Arc<AuthorizationConfig<I>>,
}

impl<I> AuthorizationLayer<I> {
	/// Create a layer with the default configuration.
	pub fn new(provider: impl AuthorizationProvider<I> + 'static) -> Self {
		Self {
			provider: Arc::new(provider),
			config: Arc::new(AuthorizationConfig::new()),
		}
	}

	/// Replace the configuration.
	pub fn with_config(mut self, config: AuthorizationConfig<I>) -> Self {
		self.config = Arc::new(config);
		self
	}
}

impl<I> Clone for AuthorizationLayer<I> {
	fn clone(&self) -> Self {
		Self {
			provider: self.provider.clone(),
			config: self.config.clone(),
		}
	}
}

impl<S, I> Layer<S> for AuthorizationLayer<I> {
	type Service = AuthorizationMiddleware<S, I>;

	fn layer(&self, inner: S) -> Self::Service {
		AuthorizationMiddleware {
			inner,
			provider: self.provider.clone(),
			config: self.config.clone(),
		}
	}
}

/// Service wrapper for [`AuthorizationLayer`].
pub struct AuthorizationMiddleware<S, I> {
	inner: S,
	provider: Arc<dyn AuthorizationProvider<I>>,
	config: Arc<AuthorizationConfig<I>>,
}

impl<S: Clone, I> Clone for AuthorizationMiddleware<S, I> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
			provider: self.provider.clone(),
			config: self.config.clone(),
		}
	}
}

impl<S, I> Service<Request<Body>> for AuthorizationMiddleware<S, I>
where
	S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
	S::Future: Send,
	I: Clone + Send + Sync + 'static,
{
	type Response = Response;
	type Error = S::Error;
	type Future = EnforceFuture<S::Future, I>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, mut req: Request<Body>) -> Self::Future {
		let service = match self.provider.authorization(&req) {
			Ok(service) => service,
			Err(error) => {
				tracing::error!(error = %error, "authorization service factory failed");
				return EnforceFuture::Rejected {
					resp: Some(AuthzFailure(error).into_response()),
				};
			}
		};

		let identity = req.extensions_mut().remove::<I>();
		let had_identity = identity.is_some();
		if let Some(identity) = identity {
			match &self.config.binding {
				IdentityBinding::Decorate => {
					req
						.extensions_mut()
						.insert(IdentityDecorator::new(service.clone(), identity));
				}
				IdentityBinding::Bind(bind) => {
					let capable = bind(service.clone(), identity);
					req.extensions_mut().insert(capable);
				}
			}
		}
		req.extensions_mut().insert(service.clone());

		let ctx = PostContext {
			service,
			had_identity,
			request: RequestInfo {
				uri: req.uri().clone(),
			},
			config: self.config.clone(),
		};

		EnforceFuture::Running {
			fut: self.inner.call(req),
			ctx: Some(ctx),
		}
	}
}

/// Facts carried across the downstream call for the post-response step.
pub struct PostContext<I> {
	service: Arc<AuthorizationService<I>>,
	had_identity: bool,
	request: RequestInfo,
	config: Arc<AuthorizationConfig<I>>,
}

pin_project! {
	/// Future for [`AuthorizationMiddleware`].
	#[project = EnforceFutureProj]
	pub enum EnforceFuture<F, I> {
		Running {
			#[pin]
			fut: F,
			ctx: Option<PostContext<I>>,
		},
		Rejected {
			resp: Option<Response>,
		},
	}
}

impl<F, E, I> Future for EnforceFuture<F, I>
where
	F: Future<Output = Result<Response, E>>,
{
	type Output = Result<Response, E>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match self.project() {
			EnforceFutureProj::Running { fut, ctx } => match fut.poll(cx) {
				Poll::Ready(Ok(response)) => {
					let ctx = ctx.take().expect("polled after completion");
					Poll::Ready(Ok(enforce(ctx, response)))
				}
				Poll::Ready(Err(error)) => Poll::Ready(Err(error)),
				Poll::Pending => Poll::Pending,
			},
			EnforceFutureProj::Rejected { resp } => {
				Poll::Ready(Ok(resp.take().expect("polled after completion")))
			}
		}
	}
}

/// Post-downstream enforcement.
///
/// Branches, in order: a surfaced authorization failure goes to the handler
/// chain; a foreign error response passes through untouched; a successful
/// response from an identity-carrying request that skipped authorization
/// raises the check-required failure; everything else passes through.
fn enforce<I>(ctx: PostContext<I>, response: Response) -> Response {
	if let Some(error) = response.extensions().get::<AuthzError>().cloned() {
		tracing::debug!(
			kind = error.kind().as_str(),
			"authorization failure surfaced by downstream"
		);
		return dispatch(&ctx, &error, response);
	}

	if response.status().is_client_error() || response.status().is_server_error() {
		// The request failed for reasons outside the authorization family.
		return response;
	}

	if ctx.config.require_check && ctx.had_identity && !ctx.service.authorization_checked() {
		tracing::error!(
			path = %ctx.request.uri.path(),
			"request with an identity completed without an authorization check"
		);
		let error = AuthzError::CheckRequired;
		let original = AuthzFailure(error.clone()).into_response();
		return dispatch(&ctx, &error, original);
	}

	response
}

/// Offer `error` to the configured unauthorized handler; a declined failure
/// surfaces as the original error response.
fn dispatch<I>(ctx: &PostContext<I>, error: &AuthzError, original: Response) -> Response {
	let Some(handler) = ctx.config.registry.get(&ctx.config.handler) else {
		tracing::error!(
			handler = %ctx.config.handler,
			"configured unauthorized handler is not registered"
		);
		return original;
	};

	match handler.handle(error, &ctx.request, &ctx.config.handler_config) {
		Some(replacement) => replacement,
		None => original,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::routing::get;
	use axum::Router;
	use http::StatusCode;
	use tower::ServiceExt;
	use warden_core::MapResolver;

	#[derive(Debug, Clone, PartialEq)]
	struct User {
		id: u64,
	}

	async fn plain() -> &'static str {
		"ok"
	}

	fn empty_provider() -> impl AuthorizationProvider<User> {
		let resolver = Arc::new(MapResolver::<User>::new());
		move |_: &Request<Body>| -> warden_core::Result<Arc<AuthorizationService<User>>> {
			Ok(Arc::new(AuthorizationService::new(resolver.clone())))
		}
	}

	#[tokio::test]
	async fn factory_failure_short_circuits() {
		let provider =
			|_: &Request<Body>| -> warden_core::Result<Arc<AuthorizationService<User>>> {
				Err(AuthzError::policy("factory exploded"))
			};
		let app = Router::new()
			.route("/", get(plain))
			.layer(AuthorizationLayer::new(provider));

		let response = app
			.oneshot(Request::get("/").body(Body::empty()).unwrap())
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[tokio::test]
	async fn request_without_identity_passes_without_check() {
		let app = Router::new()
			.route("/", get(plain))
			.layer(AuthorizationLayer::new(empty_provider()));

		let response = app
			.oneshot(Request::get("/").body(Body::empty()).unwrap())
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::OK);
	}

	#[test]
	fn layer_is_cloneable() {
		let layer = AuthorizationLayer::new(empty_provider());
		let _ = layer.clone();
	}
}
