//! Guards for selection and range properties.
//!
//! Models routinely hand wrappers positions or values the widget cannot
//! represent (stale selection after a removal, a value outside adjusted
//! bounds). Widgets must never be asked to hold an illegal state, and the
//! correction must be visible in the log rather than silent.

/// Resolves a requested selection against `item_count` items. Returns the
/// nearest representable position, or `None` when the list is empty.
pub fn clamp_position(requested: usize, item_count: usize) -> Option<usize> {
    if item_count == 0 {
        log::warn!("Ignoring selection of position {requested} in an empty list.");
        return None;
    }
    if requested >= item_count {
        let last = item_count - 1;
        log::warn!("Clamping selection of position {requested} to last item {last}.");
        return Some(last);
    }
    Some(requested)
}

/// Normalizes a multi-selection: clamps every position, then returns the
/// surviving positions ascending and deduplicated.
pub fn clamp_selection(requested: &[usize], item_count: usize) -> Vec<usize> {
    let mut clamped: Vec<usize> = requested
        .iter()
        .filter_map(|&position| clamp_position(position, item_count))
        .collect();
    clamped.sort_unstable();
    clamped.dedup();
    clamped
}

/// Clamps `value` into `[min, max]`, logging when the value moves.
pub fn clamp_value(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        log::warn!("Raising value {value} to minimum {min}.");
        min
    } else if value > max {
        log::warn!("Lowering value {value} to maximum {max}.");
        max
    } else {
        value
    }
}
