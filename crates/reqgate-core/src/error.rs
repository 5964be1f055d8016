use std::fmt;

#[derive(Debug)]
pub enum ReqGateError {
    /// The transport settled the request with a failure. Forwarded verbatim.
    Transport(std::io::Error),
    /// Dropped from the queue by a reset under `ResetPolicy::Reject`.
    Abandoned,
    /// The scheduler stopped before this request could settle.
    SchedulerClosed,
    /// The transport call unwound without ever settling.
    Interrupted,
    InvalidConfig(String),
    ConfigParse(String),
}

impl fmt::Display for ReqGateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReqGateError::Transport(e) => write!(f, "transport failure: {}", e),
            ReqGateError::Abandoned => f.write_str("request abandoned by scheduler reset"),
            ReqGateError::SchedulerClosed => f.write_str("scheduler is not running"),
            ReqGateError::Interrupted => f.write_str("transport call ended without settling"),
            ReqGateError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            ReqGateError::ConfigParse(msg) => write!(f, "failed to parse configuration: {}", msg),
        }
    }
}

impl std::error::Error for ReqGateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReqGateError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReqGateError {
    fn from(e: std::io::Error) -> Self {
        ReqGateError::Transport(e)
    }
}

impl From<toml::de::Error> for ReqGateError {
    fn from(e: toml::de::Error) -> Self {
        ReqGateError::ConfigParse(e.to_string())
    }
}
