#![no_main]

use ferrous_beans::{ArgValue, BeanSpec, ContextFactory, DiError, Scope, TypeDescriptor, TypeRegistry};
use libfuzzer_sys::fuzz_target;

struct Node;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let mut registry = TypeRegistry::new();
    if registry
        .register(
            TypeDescriptor::builder::<Node>("Node")
                .constructor(&[], |_| Ok(Node))
                .constructor(&["any"], |_| Ok(Node))
                .constructor(&["any", "any"], |_| Ok(Node)),
        )
        .is_err()
    {
        return;
    }

    // Each byte pair declares one bean with up to two references to other beans.
    let count = (data.len() / 2).min(16);
    let mut factory = ContextFactory::new().with_registry(registry);
    for (i, pair) in data.chunks_exact(2).take(count).enumerate() {
        let mut bean = BeanSpec::new("Node").with_id(format!("n{}", i));
        if pair[0] % 2 == 1 {
            bean = bean.with_scope(Scope::Prototype);
        }
        for target in [pair[0] >> 1, pair[1]].iter().take(1 + (pair[1] % 2) as usize) {
            bean = bean.arg(ArgValue::reference(format!("n{}", *target as usize % (count + 1))));
        }
        factory = factory.with(bean);
    }

    match factory.build() {
        Ok(context) => {
            // An acyclic graph resolves every bean, or reports why a reference is missing.
            for i in 0..count {
                match context.get_named::<Node>(&format!("n{}", i)) {
                    Ok(_) | Err(DiError::NoApplicableConstructor { .. }) => {}
                    Err(other) => panic!("unexpected resolution error: {}", other),
                }
            }
        }
        Err(DiError::Circular { path, .. }) => {
            assert!(path.len() >= 2);
            assert_eq!(path.first(), path.last());
        }
        Err(other) => panic!("unexpected declaration error: {}", other),
    }
});
