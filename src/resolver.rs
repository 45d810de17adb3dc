use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{host::NeighborTable, vm::VmDirectory};

/// `aa:b:c:dd:e:ff` style mac to twelve lowercase hex digits.
fn normalize_mac(raw: &str) -> Option<String> {
    let octets = raw.split([':', '-']).collect::<Vec<_>>();
    if octets.len() != 6 {
        return None;
    }

    let mut mac = String::with_capacity(12);
    for octet in octets {
        if octet.is_empty() || octet.len() > 2 || !octet.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        mac.push_str(&format!("{:0>2}", octet.to_ascii_lowercase()));
    }

    Some(mac)
}

fn token_after<'a>(tokens: &[&'a str], marker: &str) -> Option<&'a str> {
    let idx = tokens.iter().position(|t| *t == marker)?;
    tokens.get(idx + 1).copied()
}

fn parse_neighbor_line(line: &str) -> Option<(String, String)> {
    let tokens = line.split_whitespace().collect::<Vec<_>>();

    // bsd: ? (10.0.0.7) at aa:bb:cc:dd:ee:ff on bridge100 ifscope [ethernet]
    if let Some(ip) = tokens
        .iter()
        .find(|t| t.starts_with('(') && t.ends_with(')'))
    {
        let ip = ip.trim_start_matches('(').trim_end_matches(')');
        let mac = normalize_mac(token_after(&tokens, "at")?)?;
        return Some((ip.to_string(), mac));
    }

    // linux: 10.0.0.7 dev br0 lladdr aa:bb:cc:dd:ee:ff REACHABLE
    let ip = tokens.first()?;
    let mac = normalize_mac(token_after(&tokens, "lladdr")?)?;
    Some((ip.to_string(), mac))
}

/// Reduce raw neighbor table output to `<ip> <12-hex-mac>` lines. Incomplete
/// and unparseable entries are dropped.
pub fn normalize_neighbor_table(raw: &str) -> String {
    raw.lines()
        .filter_map(parse_neighbor_line)
        .map(|(ip, mac)| format!("{ip} {mac}\n"))
        .collect()
}

/// First ip in a normalized table whose mac matches, case-insensitively.
pub fn find_ip_for_mac(normalized: &str, mac: &str) -> Option<String> {
    let mac = mac.trim();
    normalized.lines().find_map(|line| {
        let (ip, line_mac) = line.trim().rsplit_once(char::is_whitespace)?;
        line_mac
            .eq_ignore_ascii_case(mac)
            .then(|| ip.trim().to_string())
    })
}

/// Maps a vm's mac to its live address, caching the answer in `0.ipaddr`.
#[derive(Clone)]
pub struct Resolver {
    neighbors: Arc<dyn NeighborTable>,
}

impl Resolver {
    pub fn new(neighbors: Arc<dyn NeighborTable>) -> Self {
        Self { neighbors }
    }

    pub async fn get_ip(&self, vm: &VmDirectory) -> Option<String> {
        if let Some(ip) = vm.read_cached_ip().await {
            debug!("Using cached ip {ip} for vm {}", vm.name());
            return Some(ip);
        }

        let mac = vm.read_mac_raw().await?;

        let table = match self.neighbors.snapshot().await {
            Ok(table) => table,
            Err(e) => {
                warn!("Failed to query neighbor table: {e}");
                return None;
            }
        };

        let ip = find_ip_for_mac(&normalize_neighbor_table(&table), &mac)?;

        match tokio::fs::write(vm.ip_path(), &ip).await {
            Ok(()) => info!("Resolved vm {} to {ip}", vm.name()),
            Err(e) => warn!("Failed to cache ip for vm {}: {e}", vm.name()),
        }

        Some(ip)
    }
}
