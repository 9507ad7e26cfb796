/// Property-based tests for literal coercion and morphing
///
/// These check that literal handling holds for arbitrary text and numbers,
/// not only for the handful of values the example-based tests use.

use ferrous_beans::{ArgValue, BeanSpec, ConstantProperty, ContextFactory, Number, Property, PropertyRef, TypeDescriptor, TypeRegistry};
use proptest::prelude::*;
use std::sync::Arc;

struct Label {
    text: String,
}

fn label_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry
        .register(TypeDescriptor::builder::<Label>("Label").constructor(&["string"], |args| {
            Ok(Label { text: args.text(0)? })
        }))
        .unwrap();
    registry
}

proptest! {
    #[test]
    fn integer_literals_round_trip_through_i64(value in any::<i64>()) {
        let context = ContextFactory::new().build().unwrap();
        let cx = context.resolver();
        let target = context.type_named("i64").unwrap();

        let literal: PropertyRef = Arc::new(ConstantProperty::new(value.to_string(), None));
        let morphed = literal.morph(&cx, &target).unwrap();
        let resolved = morphed.value(&cx).unwrap();
        prop_assert_eq!(resolved.downcast_ref::<i64>(), Some(&value));
    }
}

proptest! {
    #[test]
    fn morph_to_current_type_is_identity(value in any::<i32>()) {
        let context = ContextFactory::new().build().unwrap();
        let cx = context.resolver();
        let target = context.type_named("i32").unwrap();

        let literal: PropertyRef = Arc::new(ConstantProperty::new(value.to_string(), None));
        let once = literal.morph(&cx, &target).unwrap();
        let twice = once.clone().morph(&cx, &target).unwrap();
        prop_assert!(Arc::ptr_eq(&once, &twice));
    }
}

proptest! {
    #[test]
    fn untyped_numbers_widen_to_number(value in -1.0e9f64..1.0e9f64) {
        let context = ContextFactory::new().build().unwrap();
        let cx = context.resolver();
        let number = context.type_named("number").unwrap();

        let literal: PropertyRef = Arc::new(ConstantProperty::new(format!("{:?}", value), None));
        let resolved = literal.morph(&cx, &number).unwrap().value(&cx).unwrap();
        let widened = resolved.downcast_ref::<Number>().unwrap();
        prop_assert!((widened.as_f64() - value).abs() <= f64::EPSILON * value.abs().max(1.0));
    }
}

proptest! {
    #[test]
    fn any_text_reaches_a_string_constructor(text in "\\PC{0,40}") {
        let context = ContextFactory::new()
            .with_registry(label_registry())
            .with(BeanSpec::new("Label").with_id("label").arg(ArgValue::typed_literal(text.clone(), "string")))
            .build()
            .unwrap();

        let first = context.get_named::<Label>("label").unwrap();
        let second = context.get_named::<Label>("label").unwrap();
        prop_assert!(Arc::ptr_eq(&first, &second));
        prop_assert_eq!(&first.text, &text);
    }
}
