use clinic_token_tests::{ApiError, ApiResult};

/// Password the administrator logs in with
#[allow(unused)]
pub const ADMIN_PASSWORD: &str = "open-sesame";

/// Asserts that a request was rejected as invalid with `message`.
#[allow(unused)]
pub fn assert_rejected<T: std::fmt::Debug>(result: ApiResult<T>, message: &str) {
    assert_eq!(
        result.unwrap_err(),
        ApiError {
            status: 400,
            message: message.into(),
        },
        "The request must be rejected with {message:?}."
    );
}

/// Asserts that a request was refused for lack of an administrator session.
#[allow(unused)]
pub fn assert_unauthorized<T: std::fmt::Debug>(result: ApiResult<T>) {
    assert_eq!(
        result.unwrap_err(),
        ApiError {
            status: 401,
            message: "Admin login required".into(),
        },
        "The request must require an administrator session."
    );
}
