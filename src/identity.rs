//! Machine and installation identity used to bind tokens to a device.
//!
//! None of these values are secret. They only make a token file useless
//! when copied to another machine or user account.

use machineid_rs::{Encryption, HWIDComponent, IdBuilder};
use std::env;

const UNKNOWN: &str = "unknown";
const MACHINE_ID_SALT: &str = "tollgate";

/// Identity strings fed into key and IV derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineIdentity {
    /// Publisher name from the application config.
    pub company_name: String,
    /// Product name from the application config.
    pub product_name: String,
    /// Stable platform machine identifier.
    pub device_unique_id: String,
    /// Current OS user name.
    pub user_name: String,
    /// Operating system name and version.
    pub os_name: String,
    /// Hostname of this machine.
    pub machine_name: String,
}

impl MachineIdentity {
    /// Collects the identity of the current machine for the given product.
    ///
    /// Never fails: anything the platform will not tell us becomes `"unknown"`.
    #[must_use]
    pub fn collect(company_name: &str, product_name: &str) -> Self {
        Self {
            company_name: company_name.to_string(),
            product_name: product_name.to_string(),
            device_unique_id: get_machine_id().unwrap_or_else(|| UNKNOWN.to_string()),
            user_name: get_user_name(),
            os_name: format!("{} {}", env::consts::OS, get_os_version()),
            machine_name: get_hostname(),
        }
    }
}

fn get_user_name() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn get_os_version() -> String {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("VERSION_ID="))
                    .map(|l| {
                        l.trim_start_matches("VERSION_ID=")
                            .trim_matches('"')
                            .to_string()
                    })
            })
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        UNKNOWN.to_string()
    }
}

/// Platform system id (registry MachineGuid, IOPlatformUUID, dbus machine-id),
/// hashed by `machineid-rs` so the raw id never reaches our key seed.
fn get_machine_id() -> Option<String> {
    IdBuilder::new(Encryption::SHA256)
        .add_component(HWIDComponent::SystemID)
        .build(MACHINE_ID_SALT)
        .ok()
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_fills_every_field() {
        let id = MachineIdentity::collect("Shinymoon", "MateEngine");
        assert_eq!(id.company_name, "Shinymoon");
        assert_eq!(id.product_name, "MateEngine");
        assert!(!id.device_unique_id.is_empty());
        assert!(!id.user_name.is_empty());
        assert!(id.os_name.starts_with(env::consts::OS));
        assert!(!id.machine_name.is_empty());
    }

    #[test]
    fn machine_id_is_hashed_and_stable() {
        let Some(id) = get_machine_id() else {
            return;
        };
        assert_eq!(get_machine_id(), Some(id.clone()));

        #[cfg(target_os = "linux")]
        if let Ok(raw) = std::fs::read_to_string("/etc/machine-id") {
            assert_ne!(id, raw.trim());
        }
    }

    #[test]
    fn collect_is_stable() {
        let a = MachineIdentity::collect("Shinymoon", "MateEngine");
        let b = MachineIdentity::collect("Shinymoon", "MateEngine");
        assert_eq!(a, b);
    }
}
