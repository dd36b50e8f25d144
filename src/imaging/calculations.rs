//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Compute output dimensions under a maximum-side constraint.
///
/// If the longer source side already fits within `max_side`, or `max_side`
/// is 0 (unconstrained), the source dimensions come back unchanged — there is
/// no upscaling, ever. Otherwise the longer side becomes exactly `max_side`
/// and the shorter side is scaled proportionally, rounded to the nearest
/// pixel (floor 1, so degenerate aspect ratios never produce a zero side).
///
/// # Examples
/// ```
/// # use pixport::imaging::fit_within;
/// assert_eq!(fit_within((1200, 800), 1000), (1000, 667));
/// assert_eq!(fit_within((3000, 4000), 1000), (750, 1000));
/// assert_eq!(fit_within((640, 480), 1000), (640, 480));
/// ```
pub fn fit_within(source: (u32, u32), max_side: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if max_side == 0 || src_w.max(src_h) <= max_side {
        return source;
    }

    if src_w >= src_h {
        let scale = max_side as f64 / src_w as f64;
        (max_side, ((src_h as f64 * scale).round() as u32).max(1))
    } else {
        let scale = max_side as f64 / src_h as f64;
        (((src_w as f64 * scale).round() as u32).max(1), max_side)
    }
}
