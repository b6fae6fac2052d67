const MILLION: u64 = 1_000_000;
const THOUSAND: u64 = 1_000;

/// Compact display form of a count: `999`, `1.5k`, `2.3M`.
pub fn fmt_count(n: u64) -> String {
    if n >= MILLION {
        return format!("{:.1}M", n as f64 / MILLION as f64);
    }
    if n >= THOUSAND {
        return format!("{:.1}k", n as f64 / THOUSAND as f64);
    }
    n.to_string()
}
