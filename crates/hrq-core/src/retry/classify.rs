//! Classify transport failures into retry kinds and caller-facing errors.

use crate::callback::RequestError;
use crate::encoding;
use crate::retry::error::TransportFailure;
use crate::retry::policy::ErrorKind;
use encoding_rs::Encoding;

/// Map a curl error onto a transport failure.
pub fn classify_curl_error(e: &curl::Error) -> TransportFailure {
    if e.is_operation_timedout() {
        return TransportFailure::Timeout;
    }
    if e.is_aborted_by_callback() {
        return TransportFailure::Aborted;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return TransportFailure::Connection(e.to_string());
    }
    TransportFailure::Other(e.to_string())
}

impl From<curl::Error> for TransportFailure {
    fn from(e: curl::Error) -> Self {
        classify_curl_error(&e)
    }
}

/// Classify a transport failure for the retry decision. Any status is an
/// answer from the server, so it is never retried.
pub fn classify(failure: &TransportFailure) -> ErrorKind {
    match failure {
        TransportFailure::Status { code, .. } => ErrorKind::Server(*code),
        TransportFailure::Timeout => ErrorKind::Timeout,
        TransportFailure::Connection(_) => ErrorKind::Connection,
        TransportFailure::Aborted | TransportFailure::Other(_) => ErrorKind::Other,
    }
}

/// Build the error delivered to the caller. Server bodies are decoded with
/// the request's charset; malformed bytes are replaced rather than rejected.
pub fn to_request_error(failure: TransportFailure, charset: &'static Encoding) -> RequestError {
    match failure {
        TransportFailure::Status { code, body } => {
            RequestError::server(code, encoding::decode_lossy(charset, &body))
        }
        TransportFailure::Timeout | TransportFailure::Connection(_) => RequestError::network(),
        TransportFailure::Aborted => RequestError::other("request aborted"),
        TransportFailure::Other(message) => RequestError::other(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::OFFLINE_MESSAGE;

    fn status(code: u32) -> TransportFailure {
        TransportFailure::Status {
            code,
            body: Vec::new(),
        }
    }

    #[test]
    fn status_is_server_error() {
        assert_eq!(classify(&status(500)), ErrorKind::Server(500));
        assert_eq!(classify(&status(404)), ErrorKind::Server(404));
        assert!(!classify(&status(503)).is_transient());
    }

    #[test]
    fn curl_timeout_and_connect() {
        // CURLE_OPERATION_TIMEDOUT = 28, CURLE_COULDNT_CONNECT = 7, CURLE_URL_MALFORMAT = 3.
        assert_eq!(classify_curl_error(&curl::Error::new(28)), TransportFailure::Timeout);
        assert!(matches!(
            classify_curl_error(&curl::Error::new(7)),
            TransportFailure::Connection(_)
        ));
        assert!(matches!(
            classify_curl_error(&curl::Error::new(3)),
            TransportFailure::Other(_)
        ));
    }

    #[test]
    fn transient_kinds() {
        assert!(classify(&TransportFailure::Timeout).is_transient());
        assert!(classify(&TransportFailure::Connection("refused".into())).is_transient());
        assert!(!classify(&TransportFailure::Other("bad".into())).is_transient());
        assert!(!classify(&TransportFailure::Aborted).is_transient());
    }

    #[test]
    fn server_failure_keeps_status_and_body() {
        let err = to_request_error(
            TransportFailure::Status {
                code: 500,
                body: b"boom".to_vec(),
            },
            encoding_rs::UTF_8,
        );
        assert!(err.is_server_error());
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(err.message(), "boom");
    }

    #[test]
    fn network_failure_uses_offline_message() {
        let err = to_request_error(
            TransportFailure::Connection("Couldn't connect to server".into()),
            encoding_rs::UTF_8,
        );
        assert!(err.is_network_error());
        assert_eq!(err.message(), OFFLINE_MESSAGE);
    }

    #[test]
    fn other_failure_passes_message_through() {
        let err = to_request_error(TransportFailure::Other("malformed".into()), encoding_rs::UTF_8);
        assert!(!err.is_server_error());
        assert!(!err.is_network_error());
        assert_eq!(err.message(), "malformed");
    }
}
