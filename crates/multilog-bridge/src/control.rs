use serde::Serialize;

/// Control request: restart the device.
pub const CONTROL_REBOOT: &str = "reboot";
/// Control request: report the firmware version.
pub const CONTROL_VERSION: &str = "version";
/// Control reply sent before restarting.
pub const REPLY_REBOOTING: &str = "Rebooting";
/// Published on the control output each time a bus session starts.
pub const ANNOUNCE_CONNECTED: &str = "Device connected";

/// A request received on the control input topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlRequest {
    Reboot,
    Version,
}

impl ControlRequest {
    /// Match a control payload. The whole payload must equal a keyword.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        match payload {
            p if p == CONTROL_REBOOT.as_bytes() => Some(Self::Reboot),
            p if p == CONTROL_VERSION.as_bytes() => Some(Self::Version),
            _ => None,
        }
    }
}

/// Version string returned for [`ControlRequest::Version`].
pub fn version_string() -> String {
    format!("v{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_exact_keywords() {
        assert_eq!(ControlRequest::parse(b"reboot"), Some(ControlRequest::Reboot));
        assert_eq!(ControlRequest::parse(b"version"), Some(ControlRequest::Version));
    }

    #[test]
    fn anything_else_is_ignored() {
        for payload in [
            &b""[..],
            &b"Reboot"[..],
            &b"reboot\n"[..],
            &b" version"[..],
            &b"versions"[..],
            &b"shutdown"[..],
        ] {
            assert_eq!(ControlRequest::parse(payload), None, "{payload:?}");
        }
    }

    #[test]
    fn version_has_prefix() {
        let version = version_string();
        assert!(version.starts_with('v'));
        assert_eq!(&version[1..], env!("CARGO_PKG_VERSION"));
    }
}
