const UNITS: [(u64, &str); 3] = [
    (1000 * 1000 * 1000, "GB"),
    (1000 * 1000, "MB"),
    (1000, "KB"),
];

/// Human readable size in decimal units, e.g. `1.5MB`.
pub fn human_size(bytes: Option<u64>) -> String {
    let Some(bytes) = bytes else {
        return "Unknown length".to_string();
    };
    for (unit, name) in UNITS {
        if bytes > unit {
            return format!("{:.1}{name}", bytes as f64 / unit as f64);
        }
    }
    format!("{bytes}B")
}

#[cfg(test)]
mod tests {
    use super::human_size;

    #[test]
    fn formats_each_unit() {
        assert_eq!(human_size(None), "Unknown length");
        assert_eq!(human_size(Some(999)), "999B");
        assert_eq!(human_size(Some(1000)), "1000B");
        assert_eq!(human_size(Some(1_500_000)), "1.5MB");
        assert_eq!(human_size(Some(2_500_000_000)), "2.5GB");
    }
}
