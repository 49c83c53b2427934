//! Macros for reducing response-matching boilerplate.

/// Match a [`Response`](crate::Response) against the variant a request
/// expects, turning anything else into
/// [`ClientError::UnexpectedResponse`](crate::ClientError::UnexpectedResponse).
///
/// # Example
///
/// ```ignore
/// // Fieldless acknowledgement
/// expect_response!(response, Emote)
///
/// // Extract fields
/// expect_response!(response, GetWallet { content } => content)
/// ```
macro_rules! expect_response {
    ($response:expr, $variant:ident) => {
        match $response {
            $crate::Response::$variant { .. } => Ok(()),
            other => Err($crate::ClientError::UnexpectedResponse {
                expected: concat!(stringify!($variant), "Response"),
                got: other.kind().to_string(),
            }),
        }
    };
    ($response:expr, $variant:ident { $($field:ident),+ } => $out:expr) => {
        match $response {
            $crate::Response::$variant { $($field),+ } => Ok($out),
            other => Err($crate::ClientError::UnexpectedResponse {
                expected: concat!(stringify!($variant), "Response"),
                got: other.kind().to_string(),
            }),
        }
    };
}

pub(crate) use expect_response;
