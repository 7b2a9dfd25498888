//! Seams to the host platform.
//!
//! Every browser capability the core touches sits behind a trait here or in
//! the capability modules, so the same gateways run against the real browser
//! (`capgate-wasm`) and against the doubles in [`crate::mock`].

use std::time::Duration;

use futures::future::LocalBoxFuture;

use crate::error::PlatformError;

/// An in-flight platform request.
///
/// Methods returning this type must issue the underlying request before they
/// return; the future only waits for the outcome. Browsers tie permission
/// prompts to the user gesture that is on the stack when the request is made,
/// and that gesture is gone after the first suspension.
pub type PlatformCall<T> = LocalBoxFuture<'static, Result<T, PlatformError>>;

/// Deferred execution, `setTimeout` style.
pub trait Scheduler {
    /// Run `task` once after `delay`.
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>);
}
