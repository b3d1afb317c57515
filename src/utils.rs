use byte_unit::{Byte, UnitType};

pub fn format_size(bytes: u64) -> String {
    let adjusted = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary);
    format!("{adjusted:.2}")
}

pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_binary_units() {
        // Sub-KiB values stay in the B unit, which renders as a whole number.
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KiB");
        assert_eq!(format_size(1024 * 1024), "1.00 MiB");
    }

    #[test]
    fn percent_handles_zero_whole() {
        assert_eq!(percent(10, 0), 0.0);
        assert_eq!(percent(50, 200), 25.0);
    }
}
