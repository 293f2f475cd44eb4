use serde::Serialize;

/// Uniform `{status, data}` wrapper for every API response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ErrorData {
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

impl ApiResponse<ErrorData> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            data: ErrorData {
                message: message.into(),
            },
        }
    }
}
