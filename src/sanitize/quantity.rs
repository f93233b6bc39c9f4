//! Resource quantity parsing and display.
//!
//! CPU is normalized to millicores and memory to bytes so requests, limits
//! and live samples can be summed and compared.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use regex::Regex;
use std::sync::LazyLock;

const KI: f64 = 1024.0;
const MI: u64 = 1024 * 1024;

// ============================================================================
// CPU
// ============================================================================

/// Regex for CPU values (e.g., "100m", "1", "1.5", "250000n", "12u")
static CPU_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)(n|u|m)?$").unwrap());

/// Parse a CPU value string to millicores.
///
/// # Examples
/// - "100m" -> 100
/// - "1.5" -> 1500
/// - "250000000n" -> 250
/// - "1500u" -> 1
pub fn parse_cpu_to_millicores(cpu: &str) -> Option<u64> {
    let caps = CPU_REGEX.captures(cpu.trim())?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;

    let millicores = match caps.get(2).map(|m| m.as_str()) {
        Some("n") => value / 1_000_000.0,
        Some("u") => value / 1_000.0,
        Some("m") => value,
        _ => value * 1000.0,
    };
    Some(millicores as u64)
}

// ============================================================================
// Memory
// ============================================================================

/// Regex for memory values (e.g., "128Mi", "1Gi", "500M", "1000000000")
static MEMORY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)(Ki|Mi|Gi|Ti|Pi|Ei|k|K|M|G|T|P|E)?$").unwrap()
});

/// Parse a memory value string to bytes.
///
/// # Examples
/// - "128Mi" -> 134217728
/// - "1G" -> 1000000000
/// - "1024" -> 1024
pub fn parse_memory_to_bytes(memory: &str) -> Option<u64> {
    let caps = MEMORY_REGEX.captures(memory.trim())?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;

    let multiplier = match caps.get(2).map(|m| m.as_str()).unwrap_or("") {
        "" => 1.0,
        "Ki" => KI,
        "Mi" => KI.powi(2),
        "Gi" => KI.powi(3),
        "Ti" => KI.powi(4),
        "Pi" => KI.powi(5),
        "Ei" => KI.powi(6),
        "k" | "K" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        _ => return None,
    };
    Some((value * multiplier) as u64)
}

/// Millicores for a quantity. Unparseable values count as zero.
pub fn cpu_millicores(q: &Quantity) -> u64 {
    parse_cpu_to_millicores(&q.0).unwrap_or_else(|| {
        log::debug!("Ignoring unparseable cpu quantity {:?}", q.0);
        0
    })
}

/// Bytes for a quantity. Unparseable values count as zero.
pub fn memory_bytes(q: &Quantity) -> u64 {
    parse_memory_to_bytes(&q.0).unwrap_or_else(|| {
        log::debug!("Ignoring unparseable memory quantity {:?}", q.0);
        0
    })
}

// ============================================================================
// Display
// ============================================================================

/// Millicores as a CPU string, e.g. `1300m`.
pub fn as_mc(millicores: u64) -> String {
    format!("{}m", millicores)
}

/// Bytes as whole mebibytes, e.g. `256Mi`.
pub fn as_mb(bytes: u64) -> String {
    format!("{}Mi", bytes / MI)
}

/// A percentage for display: `130%`, `12.5%`.
pub fn as_perc(perc: f64) -> String {
    if perc.fract() == 0.0 {
        format!("{}%", perc as i64)
    } else {
        let s = format!("{:.2}", perc);
        format!("{}%", s.trim_end_matches('0').trim_end_matches('.'))
    }
}

/// `current` as a rounded percentage of `total`; zero when `total` is zero.
pub fn to_perc(current: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (current as f64 / total as f64 * 100.0).round() as u64
}
