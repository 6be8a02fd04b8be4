//! Kubernetes resource quantity parsing.
//!
//! Only what the ephemeral storage policy needs: turn a quantity string such
//! as `2Gi`, `1500M` or `1e9` into a number of bytes for comparison.

/// One gibibyte in bytes
pub const GIB: i128 = 1024 * 1024 * 1024;

/// Parse a quantity string into its value in base units.
///
/// Fractions are rounded up after scaling, as the API server does, so a
/// value just above a boundary never compares equal to it. Returns `None` for
/// anything that is not a valid quantity.
pub fn parse_quantity(input: &str) -> Option<i128> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(split);
    let number: f64 = number.parse().ok()?;

    let scaled = match suffix {
        "" => number,
        "m" => number / 1000.0,
        "k" => number * 1e3,
        "M" => number * 1e6,
        "G" => number * 1e9,
        "T" => number * 1e12,
        "P" => number * 1e15,
        "E" => number * 1e18,
        "Ki" => number * 1024f64,
        "Mi" => number * 1024f64.powi(2),
        "Gi" => number * 1024f64.powi(3),
        "Ti" => number * 1024f64.powi(4),
        "Pi" => number * 1024f64.powi(5),
        "Ei" => number * 1024f64.powi(6),
        exp if exp.starts_with(['e', 'E']) => {
            let exponent: i32 = exp.get(1..)?.parse().ok()?;
            number * 10f64.powi(exponent)
        }
        _ => return None,
    };

    if !scaled.is_finite() {
        return None;
    }
    Some(scaled.ceil() as i128)
}
