// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Axum integration for the warden authorization core.
//!
//! The crate wires [`warden_core`] into a tower stack:
//!
//! - [`AuthorizationLayer`] builds a per-request [`AuthorizationService`] from
//!   a host-supplied provider, decorates the authenticated identity, and after
//!   the handler ran enforces that a check actually happened.
//! - [`Identity`] and [`Authorization`] extract the decorated identity and the
//!   raw service inside handlers.
//! - [`AuthzFailure`] carries a denial out of a handler as a response; the
//!   layer recognizes it and offers it to the configured unauthorized handler
//!   (rethrow as-is, or redirect to a login URL).
//!
//! ```ignore
//! let resolver = Arc::new(MapResolver::new().register::<Article>(ArticlePolicy));
//! let provider = move |_: &Request<Body>| {
//!     Ok(Arc::new(AuthorizationService::new(resolver.clone())))
//! };
//!
//! let app = Router::new()
//!     .route("/articles/{id}", get(show_article))
//!     .layer(AuthorizationLayer::new(provider))
//!     .layer(authentication_layer);
//!
//! async fn show_article(Identity(user): Identity<User>) -> Result<String, AuthzFailure> {
//!     let article = load_article();
//!     user.authorize("view", &article)?;
//!     Ok(render(article))
//! }
//! ```
//!
//! [`AuthorizationService`]: warden_core::AuthorizationService

pub mod config;
pub mod extract;
pub mod failure;
pub mod handlers;
pub mod middleware;

pub use config::AuthorizationConfig;
pub use extract::{Authorization, Identity};
pub use failure::{status_for, AuthzFailure, ErrorResponse};
pub use handlers::{
	ExceptionHandler, HandlerConfig, HandlerRegistry, RedirectHandler, RequestInfo,
	RouteRedirectHandler, RouteResolver, UnauthorizedHandler, EXCEPTION_HANDLER, REDIRECT_HANDLER,
};
pub use middleware::{AuthorizationLayer, AuthorizationMiddleware, AuthorizationProvider};

pub use warden_core;
