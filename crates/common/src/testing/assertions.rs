//! Custom assertions for error-heavy tests

/// Assert that a result is an error whose display text contains a substring
///
/// # Examples
///
/// ```
/// let result: Result<(), String> = Err("request timed out after 15s".to_string());
/// studiolink_common::assert_error_contains!(result, "timed out");
/// ```
#[macro_export]
macro_rules! assert_error_contains {
    ($result:expr, $substring:expr) => {
        match &$result {
            Ok(_) => panic!("Expected error but got Ok"),
            Err(e) => {
                let error_msg = format!("{}", e);
                assert!(
                    error_msg.contains($substring),
                    "Error message '{}' does not contain '{}'",
                    error_msg,
                    $substring
                );
            }
        }
    };
}

/// Assert an attempt counter with a readable failure message
#[macro_export]
macro_rules! assert_attempts {
    ($actual:expr, $expected:expr) => {
        assert_eq!($actual, $expected, "Expected {} attempts but got {}", $expected, $actual);
    };
}
