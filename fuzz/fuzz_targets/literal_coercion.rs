#![no_main]

use ferrous_beans::{ConstantProperty, ContextFactory, Property, PropertyRef};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

const TARGETS: [&str; 12] = [
    "any", "string", "number", "i8", "i16", "i32", "i64", "f32", "f64", "char", "bool", "type",
];

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let text = match std::str::from_utf8(&data[1..]) {
        Ok(text) => text,
        Err(_) => return,
    };

    let context = match ContextFactory::new().build() {
        Ok(context) => context,
        Err(_) => return,
    };
    let cx = context.resolver();
    let target = match context.type_named(TARGETS[data[0] as usize % TARGETS.len()]) {
        Some(target) => target,
        None => return,
    };

    // Coercion either succeeds with a value of the target type or reports an error; it never panics.
    let literal: PropertyRef = Arc::new(ConstantProperty::new(text, None));
    if literal.is_resolvable_as(&cx, &target) {
        if let Ok(morphed) = literal.morph(&cx, &target) {
            if let Ok(instance) = morphed.value(&cx) {
                assert!(instance.type_handle().is_assignable_to(&target));
            }
        }
    }

    // Declared literals go through the same path.
    let typed = ConstantProperty::new(text, Some(target.name()));
    let _ = typed.value(&cx);
});
