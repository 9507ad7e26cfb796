/// Unit tests for DiError display strings, categories and sources

use ferrous_beans::{ConstructorPanic, DiError, DiResult, ErrorKind, SharedError};
use std::error::Error;
use std::sync::Arc;

#[test]
fn test_error_display_not_found() {
    let error = DiError::NotFound("repository".to_string());
    assert_eq!(error.to_string(), "Bean not found: repository");
    assert_eq!(error.kind(), ErrorKind::Resolution);
}

#[test]
fn test_error_display_type_not_found_with_and_without_artifact() {
    let ambient = DiError::TypeNotFound {
        bean: "svc".to_string(),
        type_name: "Service".to_string(),
        artifact: None,
    };
    assert_eq!(ambient.to_string(), "Bean 'svc': type 'Service' not found");

    let isolated = DiError::TypeNotFound {
        bean: "svc".to_string(),
        type_name: "Service".to_string(),
        artifact: Some("plugins".to_string()),
    };
    assert_eq!(isolated.to_string(), "Bean 'svc': type 'Service' not found in artifact 'plugins'");
}

#[test]
fn test_error_display_no_applicable_method() {
    let error = DiError::NoApplicableMethod {
        bean: "conn".to_string(),
        type_name: "Pool".to_string(),
        method: "connect".to_string(),
        arguments: 2,
    };
    assert_eq!(
        error.to_string(),
        "Bean 'conn': no applicable factory method 'connect' on 'Pool' for 2 argument(s)"
    );
}

#[test]
fn test_error_display_coercion() {
    let error = DiError::Coercion {
        text: "yes please".to_string(),
        target: "bool".to_string(),
        reason: "not a boolean".to_string(),
    };
    assert_eq!(error.to_string(), "Cannot coerce 'yes please' into 'bool': not a boolean");
}

#[test]
fn test_error_display_circular_joins_path() {
    let error = DiError::Circular {
        bean: "a".to_string(),
        type_name: "Node".to_string(),
        path: vec!["a".to_string(), "b".to_string(), "c".to_string(), "a".to_string()],
    };
    assert_eq!(error.to_string(), "Circular reference at bean 'a' (Node): a -> b -> c -> a");
}

#[test]
fn test_declaration_errors() {
    let errors = [
        DiError::SparseArguments { bean: "b".to_string(), index: 3, count: 2 },
        DiError::DuplicateArgumentIndex { bean: "b".to_string(), index: 0 },
        DiError::UnknownShape { bean: "b".to_string(), shape: "set".to_string() },
        DiError::DuplicateBean("b".to_string()),
        DiError::MissingImplementation("b".to_string()),
        DiError::InvalidSpec("eof".to_string()),
    ];
    for error in &errors {
        assert_eq!(error.kind(), ErrorKind::Declaration, "{}", error);
    }
    assert_eq!(
        errors[0].to_string(),
        "Bean 'b': argument index 3 is out of range for 2 arguments"
    );
    assert_eq!(errors[2].to_string(), "Bean 'b': unknown container shape 'set'");
}

#[test]
fn test_instantiation_exposes_its_source() {
    let source: SharedError = Arc::new(ConstructorPanic("boom".to_string()));
    let error = DiError::Instantiation {
        bean: "svc".to_string(),
        type_name: "Service".to_string(),
        source,
    };
    assert_eq!(error.kind(), ErrorKind::Construction);
    assert_eq!(
        error.to_string(),
        "Failed to instantiate bean 'svc' of type 'Service': constructor panicked: boom"
    );
    let cause = error.source().unwrap();
    assert_eq!(cause.to_string(), "constructor panicked: boom");
}

#[test]
fn test_argument_error_wraps_its_cause() {
    let error = DiError::Argument {
        bean: "endpoint".to_string(),
        type_name: "Endpoint".to_string(),
        index: 1,
        source: Box::new(DiError::IncompatibleMorph {
            from: "string".to_string(),
            to: "bool".to_string(),
        }),
    };
    assert_eq!(error.kind(), ErrorKind::Resolution);
    assert_eq!(
        error.to_string(),
        "Bean 'endpoint': argument 1 of 'Endpoint' is invalid: Cannot morph 'string' into 'bool'"
    );
    assert_eq!(error.source().unwrap().to_string(), "Cannot morph 'string' into 'bool'");
}

#[test]
fn test_errors_are_cloneable() {
    let original = DiError::BeanNotOfType {
        bean: "port".to_string(),
        expected: "string".to_string(),
        actual: "i32".to_string(),
    };
    let cloned = original.clone();
    assert_eq!(original.to_string(), cloned.to_string());
    assert_eq!(cloned.to_string(), "Bean 'port' is a 'i32', not a 'string'");
}

#[test]
fn test_di_result_alias() {
    fn lookup(found: bool) -> DiResult<u8> {
        if found {
            Ok(7)
        } else {
            Err(DiError::NoBeanOfType("u8".to_string()))
        }
    }
    assert_eq!(lookup(true).unwrap(), 7);
    assert_eq!(lookup(false).unwrap_err().to_string(), "No bean assignable to type: u8");
}
