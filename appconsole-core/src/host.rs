use serde::{Deserialize, Serialize};

/// Host information the service sends unsolicited after the handshake
/// (the `generalInfo` message).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
    pub app_name: String,
    pub app_version: String,
    pub platform: String,
    pub host_name: String,
}

impl HostInfo {
    /// Build host info for the running process, filling in platform and
    /// host name from the environment.
    pub fn new(app_name: impl Into<String>, app_version: impl Into<String>) -> HostInfo {
        HostInfo {
            app_name: app_name.into(),
            app_version: app_version.into(),
            platform: std::env::consts::OS.to_string(),
            host_name: std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let info = HostInfo::new("demo", "1.2.3");
        let bytes = serde_json::to_vec(&info).unwrap();
        let back: HostInfo = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(info, back);
    }

    #[test]
    fn wire_field_names_are_camel_case() {
        let info = HostInfo::new("demo", "1.2.3");
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"appName\""));
        assert!(json.contains("\"appVersion\""));
        assert!(json.contains("\"hostName\""));
    }
}
