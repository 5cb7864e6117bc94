//! Human-readable emissions values.

/// Unit appended to every formatted value.
pub const EMISSIONS_UNIT: &str = "kgCO2e";

/// Fractional digits used in user notices.
pub const DEFAULT_DECIMALS: usize = 2;

const SCIENTIFIC_BELOW: f64 = 1e-3;
const SCIENTIFIC_ABOVE: f64 = 1e6;

/// Format an emissions value with `decimals` fractional digits.
///
/// Positive values below `1e-3` and values above `1e6` use scientific
/// notation without an explicit `+` in the exponent. The thresholds are
/// compared against the signed value, so negative inputs always take the
/// fixed-point form.
///
/// ```
/// use tracker_supervisor::format_emissions;
/// assert_eq!(format_emissions(0.0001, 2), "1.00e-4 kgCO2e");
/// assert_eq!(format_emissions(0.5, 2), "0.50 kgCO2e");
/// ```
pub fn format_emissions(value: f64, decimals: usize) -> String {
    let value_string = if uses_scientific(value) {
        format!("{:.*e}", decimals, value).replace('+', "")
    } else {
        format!("{:.*}", decimals, value)
    };
    format!("{} {}", value_string, EMISSIONS_UNIT)
}

fn uses_scientific(value: f64) -> bool {
    (value > 0.0 && value < SCIENTIFIC_BELOW) || value > SCIENTIFIC_ABOVE
}
