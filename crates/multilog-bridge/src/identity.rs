use crate::error::{BridgeError, Result};

/// Prefix of the bus client identifier.
pub const PROJECT_NAME: &str = "MULTILOG";

const MAX_UUID_LEN: usize = 64;

/// Identity of the device on the bus.
///
/// The identifier becomes the first topic segment of every topic the device
/// uses, so it must not contain topic separators or wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    uuid: String,
    client_id: String,
}

impl DeviceIdentity {
    /// Build an identity from an identifier string.
    ///
    /// A hardware address written as six hex pairs separated by `:` or `-`
    /// is normalized to its twelve uppercase hex digits.
    pub fn new(uuid: impl AsRef<str>) -> Result<Self> {
        let raw = uuid.as_ref().trim();
        let uuid = normalize_hw_address(raw).unwrap_or_else(|| raw.to_string());

        if uuid.is_empty() {
            return Err(BridgeError::InvalidIdentity(
                "device identifier is empty".to_string(),
            ));
        }
        if uuid.len() > MAX_UUID_LEN {
            return Err(BridgeError::InvalidIdentity(format!(
                "device identifier longer than {MAX_UUID_LEN} bytes"
            )));
        }
        if let Some(c) = uuid
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(BridgeError::InvalidIdentity(format!(
                "character {c:?} is not allowed in a device identifier"
            )));
        }

        let client_id = format!("{PROJECT_NAME}_{uuid}");
        Ok(Self { uuid, client_id })
    }

    /// Identity derived from a 6-byte hardware address.
    pub fn from_hw_address(address: [u8; 6]) -> Self {
        let uuid: String = address.iter().map(|b| format!("{b:02X}")).collect();
        let client_id = format!("{PROJECT_NAME}_{uuid}");
        Self { uuid, client_id }
    }

    /// The identifier used as topic root.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// The client identifier presented to the broker.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

fn normalize_hw_address(raw: &str) -> Option<String> {
    let pairs: Vec<&str> = raw.split([':', '-']).collect();
    if pairs.len() != 6 {
        return None;
    }
    let mut address = [0u8; 6];
    for (slot, pair) in address.iter_mut().zip(&pairs) {
        if pair.len() != 2 {
            return None;
        }
        *slot = u8::from_str_radix(pair, 16).ok()?;
    }
    Some(DeviceIdentity::from_hw_address(address).uuid)
}
