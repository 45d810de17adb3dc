use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;

use crate::provider::ProviderContext;

const CLOUD_CONFIG_HEADER: &str = "#cloud-config\n";
const DEFAULT_PREFIX_LEN: &str = "/24";

#[derive(Debug, Serialize)]
struct MetaData<'a> {
    #[serde(rename = "instance-id")]
    instance_id: &'a str,
    #[serde(rename = "local-hostname")]
    local_hostname: &'a str,
}

#[derive(Debug, Serialize)]
struct NetworkConfig {
    version: u8,
    ethernets: BTreeMap<String, Ethernet>,
}

#[derive(Debug, Serialize)]
struct Ethernet {
    #[serde(rename = "match")]
    match_: EthernetMatch,
    dhcp4: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    addresses: Vec<String>,
}

#[derive(Debug, Serialize)]
struct EthernetMatch {
    name: String,
}

#[derive(Debug, Serialize)]
struct UserData<'a> {
    users: Vec<CloudUser<'a>>,
}

#[derive(Debug, Serialize)]
struct CloudUser<'a> {
    name: &'a str,
    sudo: &'a str,
    shell: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ssh_authorized_keys: Vec<&'a str>,
}

pub fn render_meta_data(ctx: &ProviderContext) -> Result<String> {
    Ok(serde_yaml::to_string(&MetaData {
        instance_id: &ctx.vm_name,
        local_hostname: &ctx.vm_name,
    })?)
}

/// Netplan v2 document for the single nic. No static address means dhcp.
pub fn render_network_config(ctx: &ProviderContext) -> Result<String> {
    let static_ip = ctx
        .static_ip_address
        .as_deref()
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    let ethernet = match static_ip {
        Some(ip) => {
            let address = if ip.contains('/') {
                ip.to_string()
            } else {
                format!("{ip}{DEFAULT_PREFIX_LEN}")
            };
            Ethernet {
                match_: EthernetMatch {
                    name: "en*".to_string(),
                },
                dhcp4: false,
                addresses: vec![address],
            }
        }
        None => Ethernet {
            match_: EthernetMatch {
                name: "en*".to_string(),
            },
            dhcp4: true,
            addresses: vec![],
        },
    };

    let mut ethernets = BTreeMap::new();
    ethernets.insert("primary".to_string(), ethernet);

    Ok(serde_yaml::to_string(&NetworkConfig {
        version: 2,
        ethernets,
    })?)
}

pub fn render_user_data(ctx: &ProviderContext) -> Result<String> {
    let key = ctx.ssh_public_key.trim();
    let user = CloudUser {
        name: &ctx.username,
        sudo: "ALL=(ALL) NOPASSWD:ALL",
        shell: "/bin/bash",
        ssh_authorized_keys: if key.is_empty() { vec![] } else { vec![key] },
    };

    let body = serde_yaml::to_string(&UserData { users: vec![user] })?;
    Ok(format!("{CLOUD_CONFIG_HEADER}{body}"))
}

#[cfg(test)]
mod tests {
    use serde_yaml::Value;

    use super::*;

    fn ctx() -> ProviderContext {
        ProviderContext {
            vm_name: "vm1".to_string(),
            static_ip_address: None,
            username: "alice".to_string(),
            ssh_public_key: "ssh-ed25519 AAAA alice@host".to_string(),
        }
    }

    #[test]
    fn test_meta_data() {
        let doc: Value = serde_yaml::from_str(&render_meta_data(&ctx()).unwrap()).unwrap();
        assert_eq!(doc["instance-id"].as_str(), Some("vm1"));
        assert_eq!(doc["local-hostname"].as_str(), Some("vm1"));
    }

    #[test]
    fn test_network_config_dhcp() {
        let doc: Value =
            serde_yaml::from_str(&render_network_config(&ctx()).unwrap()).unwrap();
        let nic = &doc["ethernets"]["primary"];

        assert_eq!(doc["version"].as_u64(), Some(2));
        assert_eq!(nic["match"]["name"].as_str(), Some("en*"));
        assert_eq!(nic["dhcp4"].as_bool(), Some(true));
        assert!(nic.get("addresses").is_none());
    }

    #[test]
    fn test_network_config_static() {
        let mut ctx = ctx();
        ctx.static_ip_address = Some("192.168.64.10".to_string());
        let doc: Value =
            serde_yaml::from_str(&render_network_config(&ctx).unwrap()).unwrap();
        let nic = &doc["ethernets"]["primary"];

        assert_eq!(nic["dhcp4"].as_bool(), Some(false));
        assert_eq!(nic["addresses"][0].as_str(), Some("192.168.64.10/24"));

        ctx.static_ip_address = Some("10.0.0.2/16".to_string());
        let doc: Value =
            serde_yaml::from_str(&render_network_config(&ctx).unwrap()).unwrap();
        assert_eq!(
            doc["ethernets"]["primary"]["addresses"][0].as_str(),
            Some("10.0.0.2/16")
        );
    }

    #[test]
    fn test_empty_static_ip_is_dhcp() {
        let mut ctx = ctx();
        ctx.static_ip_address = Some("  ".to_string());
        let doc: Value =
            serde_yaml::from_str(&render_network_config(&ctx).unwrap()).unwrap();
        assert_eq!(doc["ethernets"]["primary"]["dhcp4"].as_bool(), Some(true));
    }

    #[test]
    fn test_user_data() {
        let rendered = render_user_data(&ctx()).unwrap();
        assert!(rendered.starts_with("#cloud-config\n"));

        let doc: Value = serde_yaml::from_str(&rendered).unwrap();
        let user = &doc["users"][0];
        assert_eq!(user["name"].as_str(), Some("alice"));
        assert_eq!(user["sudo"].as_str(), Some("ALL=(ALL) NOPASSWD:ALL"));
        assert_eq!(user["shell"].as_str(), Some("/bin/bash"));
        assert_eq!(
            user["ssh_authorized_keys"][0].as_str(),
            Some("ssh-ed25519 AAAA alice@host")
        );
    }

    #[test]
    fn test_user_data_without_key() {
        let mut ctx = ctx();
        ctx.ssh_public_key = String::new();
        let doc: Value = serde_yaml::from_str(&render_user_data(&ctx).unwrap()).unwrap();
        assert!(doc["users"][0].get("ssh_authorized_keys").is_none());
    }
}
