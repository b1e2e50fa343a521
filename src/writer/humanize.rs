const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

/// Formats a byte count with binary prefixes, e.g. `1.5 GiB`.
pub fn humanize_bytes(n: Option<i64>) -> String {
    let n = match n {
        Some(n) => n,
        None => return String::new(),
    };
    if n < 1024 {
        return format!("{} B", n);
    }

    let mut value = n as f64;
    for unit in &UNITS[..UNITS.len() - 1] {
        if value.abs() < 1024.0 {
            return format!("{:.1} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1} {}", value, UNITS[UNITS.len() - 1])
}
