//! Literal coercion: turning declared text into typed instances.

use tracing::trace;

use super::registry::builtin;
use super::{Args, Instance, TypeHandle, TypeRegistry};
use crate::error::{BoxError, DiError, DiResult};
use crate::internal::catch_panics;

/// Converts `text` into an instance of `target`.
///
/// Rules are tried in order: the text type itself, core parsers, type names
/// for `type`, then the target's parser and finally a constructor taking one
/// `string`. Only a committed literal reaches the last two; an untargeted one
/// is always coerced to `string`.
pub(crate) fn coerce(text: &str, target: &TypeHandle, registry: &TypeRegistry) -> DiResult<Instance> {
    trace!(text, target = %target, "coercing literal");

    if target.is_string() || target.is_any() {
        return Ok(Instance::new(builtin::string().clone(), text.to_string()));
    }
    let descriptor = match target.descriptor() {
        Some(descriptor) => descriptor,
        None => return Err(failure(text, target, "literals cannot form a sequence")),
    };

    if descriptor.is_core() {
        if let Some(parsed) = descriptor.parse(text) {
            return parsed
                .map(|value| Instance::from_arc(target.clone(), value))
                .map_err(|e| failure(text, target, e));
        }
    }
    if target == builtin::type_handle() {
        return registry
            .resolve(text)
            .map(|handle| Instance::new(target.clone(), handle))
            .ok_or_else(|| failure(text, target, "unknown type name"));
    }
    if let Some(parsed) = descriptor.parse(text) {
        return parsed
            .map(|value| Instance::from_arc(target.clone(), value))
            .map_err(|e| failure(text, target, e));
    }
    if let Some(constructor) = descriptor.constructors().iter().find(|c| takes_one_string(&c.params(target))) {
        let args = Args::new(vec![Instance::new(builtin::string().clone(), text.to_string())]);
        return catch_panics(|| constructor.invoke(&args))
            .map(|value| Instance::from_arc(target.clone(), value))
            .map_err(|e| failure(text, target, e));
    }

    Err(failure(text, target, "no parser or single string constructor"))
}

/// Whether [`coerce`] would succeed, without constructing anything.
///
/// Parsers are pure and are therefore attempted; a single `string`
/// constructor only has to exist.
pub(crate) fn can_coerce(text: &str, target: &TypeHandle, registry: &TypeRegistry) -> bool {
    if target.is_string() || target.is_any() {
        return true;
    }
    let descriptor = match target.descriptor() {
        Some(descriptor) => descriptor,
        None => return false,
    };
    if let Some(parsed) = descriptor.parse(text) {
        return parsed.is_ok();
    }
    if target == builtin::type_handle() {
        return registry.resolve(text).is_some();
    }
    descriptor.constructors().iter().any(|c| takes_one_string(&c.params(target)))
}

fn takes_one_string(params: &[TypeHandle]) -> bool {
    matches!(params, [only] if only.is_string())
}

fn failure(text: &str, target: &TypeHandle, reason: impl Into<BoxError>) -> DiError {
    DiError::Coercion {
        text: text.to_string(),
        target: target.name(),
        reason: reason.into().to_string(),
    }
}
