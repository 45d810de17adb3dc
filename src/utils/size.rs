use anyhow::{Result, bail};

/// Parse a memory size into MiB. A bare number is already MiB; `M`/`MB`/`MiB`
/// and `G`/`GB`/`GiB` suffixes are accepted, case-insensitively.
pub fn parse_memory_mib(size: &str) -> Result<u64> {
    let s = size.trim();
    if s.is_empty() {
        bail!("empty memory size");
    }

    let (num_part, unit_part) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let number: u64 = num_part
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid memory size: {s}"))?;

    let mut unit = unit_part.trim().to_uppercase();
    if unit.ends_with('B') {
        unit.pop();
    }

    let factor = match unit.as_str() {
        "" | "M" | "MI" => 1,
        "G" | "GI" => 1024,
        _ => bail!("unknown memory size suffix: {unit_part}"),
    };

    let mib = number
        .checked_mul(factor)
        .ok_or(anyhow::anyhow!("memory size too large"))?;

    if mib == 0 {
        bail!("memory size must be positive");
    }

    Ok(mib)
}

pub fn format_memory_mib(mib: u64) -> String {
    if mib >= 1024 && mib % 1024 == 0 {
        format!("{}G", mib / 1024)
    } else {
        format!("{mib}M")
    }
}
