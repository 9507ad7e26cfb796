//! Diagnostic observers for bean construction.
//!
//! Observers receive a callback around every construction a context performs,
//! enabling structured tracing, timing and post-mortem analysis of how an
//! object graph came into existence.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::DiError;

/// Observer trait for bean construction events.
///
/// Callbacks run synchronously on the constructing thread. Keep
/// implementations lightweight; queue expensive work elsewhere.
///
/// # Examples
///
/// ```
/// use ferrous_beans::{ContextFactory, ContextObserver, DiError};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Counting {
///     built: AtomicUsize,
/// }
///
/// impl ContextObserver for Counting {
///     fn constructing(&self, _bean: &str, _type_name: &str) {}
///
///     fn constructed(&self, _bean: &str, _type_name: &str, _duration: Duration) {
///         self.built.fetch_add(1, Ordering::SeqCst);
///     }
///
///     fn construction_failed(&self, _bean: &str, _error: &DiError) {}
/// }
///
/// let observer = Arc::new(Counting::default());
/// let context = ContextFactory::new()
///     .with_observer(observer.clone())
///     .build()
///     .unwrap();
/// assert_eq!(observer.built.load(Ordering::SeqCst), 0);
/// # drop(context);
/// ```
pub trait ContextObserver: Send + Sync {
    /// Called before a bean's constructor or factory method is invoked.
    ///
    /// # Arguments
    ///
    /// * `bean` - Identifier of the bean being constructed
    /// * `type_name` - Declared implementation type or factory method
    fn constructing(&self, bean: &str, type_name: &str);

    /// Called after a bean was constructed and activated.
    ///
    /// `duration` covers argument resolution, invocation and activation.
    fn constructed(&self, bean: &str, type_name: &str, duration: Duration);

    /// Called when constructing a bean failed.
    fn construction_failed(&self, bean: &str, error: &DiError);
}

/// Container for registered observers.
///
/// Designed to cost nothing beyond an emptiness check when no observer is
/// registered.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn ContextObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn ContextObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn constructing(&self, bean: &str, type_name: &str) {
        for observer in &self.observers {
            observer.constructing(bean, type_name);
        }
    }

    #[inline]
    pub(crate) fn constructed(&self, bean: &str, type_name: &str, duration: Duration) {
        for observer in &self.observers {
            observer.constructed(bean, type_name, duration);
        }
    }

    #[inline]
    pub(crate) fn construction_failed(&self, bean: &str, error: &DiError) {
        for observer in &self.observers {
            observer.construction_failed(bean, error);
        }
    }
}

/// Built-in observer forwarding events to `tracing`.
///
/// Successful constructions are emitted at `debug`, failures at `warn`,
/// under the target `ferrous_beans::construction` unless another is given.
///
/// # Examples
///
/// ```
/// use ferrous_beans::{ContextFactory, TracingObserver};
/// use std::sync::Arc;
///
/// let context = ContextFactory::new()
///     .with_observer(Arc::new(TracingObserver::new()))
///     .build()
///     .unwrap();
/// # drop(context);
/// ```
pub struct TracingObserver {
    label: String,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self {
            label: "ferrous-beans".to_string(),
        }
    }

    /// Creates an observer whose events carry a custom `label` field.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextObserver for TracingObserver {
    fn constructing(&self, bean: &str, type_name: &str) {
        debug!(target: "ferrous_beans::construction", label = %self.label, bean, type_name, "constructing");
    }

    fn constructed(&self, bean: &str, type_name: &str, duration: Duration) {
        debug!(
            target: "ferrous_beans::construction",
            label = %self.label,
            bean,
            type_name,
            elapsed_us = duration.as_micros() as u64,
            "constructed"
        );
    }

    fn construction_failed(&self, bean: &str, error: &DiError) {
        warn!(target: "ferrous_beans::construction", label = %self.label, bean, %error, "construction failed");
    }
}
