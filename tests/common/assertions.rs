//! Custom assertion macros

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a JSON error body names `field`
#[macro_export]
macro_rules! assert_field_error {
    ($body:expr, $field:expr) => {{
        let body = &$body;
        assert!(
            body["fields"][$field].is_string(),
            "Expected a field error for `{}` in {}",
            $field,
            body
        );
    }};
}
