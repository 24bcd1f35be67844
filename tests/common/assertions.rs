//! Custom assertion macros
//!
//! Enhanced assertions with more descriptive failure messages for frame
//! and response checks.

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $message:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $message, e),
        }
    };
}

/// Assert that a string contains a substring
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "Expected '{}' to contain '{}'",
            $haystack,
            $needle
        );
    };
}

/// Assert that a frame is a heartbeat
#[macro_export]
macro_rules! assert_heartbeat {
    ($frame:expr) => {
        assert!(
            $frame.starts_with("data: Cycle: ") && $frame.ends_with("\n\n"),
            "Expected a heartbeat frame, got {:?}",
            $frame
        );
    };
}
