// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request-scoped authorization decisions for Warden.
//!
//! This crate is the decision pipeline: policies decide, resolvers locate
//! policies, the per-request [`AuthorizationService`] orchestrates and tracks
//! that a check happened, and [`IdentityDecorator`] gives the authenticated
//! identity a `can`/`apply_scope` surface. The HTTP enforcement layer lives in
//! `warden-axum`.
//!
//! # Overview
//!
//! - Applications implement [`Policy`] per resource type and register them in
//!   a [`MapResolver`] (or chain resolvers with [`CompositeResolver`]).
//! - The middleware creates one [`AuthorizationService`] per request.
//! - Any decision - allow, deny, or policy failure - records that the request
//!   exercised authorization; the middleware uses that signal to catch
//!   handlers that forgot to ask.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use warden_core::{
//!     AuthorizationService, AuthzError, MapResolver, Policy, Resource,
//! };
//!
//! struct User { id: u64 }
//! struct Article { author: u64 }
//!
//! struct ArticlePolicy;
//!
//! impl Policy<User> for ArticlePolicy {
//!     fn can(&self, user: &User, action: &str, resource: &dyn Resource)
//!         -> warden_core::Result<bool>
//!     {
//!         let article = resource
//!             .downcast_ref::<Article>()
//!             .ok_or_else(|| AuthzError::policy("expected an article"))?;
//!         Ok(action == "view" || article.author == user.id)
//!     }
//! }
//!
//! let resolver = MapResolver::new().register::<Article>(ArticlePolicy);
//! let service = AuthorizationService::new(Arc::new(resolver));
//!
//! let user = User { id: 7 };
//! assert!(service.can(&user, "edit", &Article { author: 7 })?);
//! assert!(service.authorization_checked());
//! # Ok::<(), AuthzError>(())
//! ```

pub mod error;
pub mod identity;
pub mod policy;
pub mod resolver;
pub mod service;

pub use error::{AuthzError, AuthzErrorKind, Result};
pub use identity::{IdentityBinding, IdentityDecorator};
pub use policy::{Policy, Resource};
pub use resolver::{CompositeResolver, MapResolver, PolicyResolver};
pub use service::AuthorizationService;
