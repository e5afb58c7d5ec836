#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_error_display() {
        let err = SessionError::Connect("dns failure".into());
        assert_eq!(err.to_string(), "connect failed: dns failure");

        let err = SessionError::Transport("broken pipe".into());
        assert_eq!(err.to_string(), "transport error: broken pipe");
    }
}
