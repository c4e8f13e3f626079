/// Compact decimal rendering: integers without a fraction, others trimmed.
pub fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{value:.0}");
    }

    let text = format!("{value:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_owned()
    } else {
        text.to_owned()
    }
}

/// Evenly spaced 1/2/5 multiples covering `min..=max`.
pub fn nice_ticks(min: f64, max: f64, target_count: usize) -> Vec<f64> {
    let range = max - min;
    if !range.is_finite() || range <= 0.0 || target_count == 0 {
        return Vec::new();
    }

    let rough_step = range / target_count as f64;
    let magnitude = 10.0_f64.powf(rough_step.log10().floor());
    let normalized = rough_step / magnitude;
    let step = if normalized < 1.5 {
        magnitude
    } else if normalized < 3.5 {
        magnitude * 2.0
    } else if normalized < 7.5 {
        magnitude * 5.0
    } else {
        magnitude * 10.0
    };

    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(|multiple| multiple as f64 * step).collect()
}
