//! Double-threshold hysteresis on a thinned magnitude image.
use crate::image::{ImageF32, Mask};

/// Keeps every pixel `>= high`, plus pixels `>= low` that are 8-connected to
/// one of them through other `>= low` pixels.
pub fn hysteresis(thin: &ImageF32, low: f32, high: f32) -> Mask {
    let (w, h) = (thin.w, thin.h);
    let mut out = Mask::new(w, h);
    let mut stack = Vec::new();
    for (i, &v) in thin.data.iter().enumerate() {
        if v >= high && v > 0.0 {
            out.data[i] = true;
            stack.push(i);
        }
    }
    while let Some(i) = stack.pop() {
        let (x, y) = (i % w, i / w);
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                let j = ny * w + nx;
                if !out.data[j] && thin.data[j] >= low && thin.data[j] > 0.0 {
                    out.data[j] = true;
                    stack.push(j);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weak_pixels_survive_only_when_connected() {
        let mut thin = ImageF32::new(6, 1);
        thin.data = vec![0.9, 0.4, 0.4, 0.0, 0.4, 0.0];
        let mask = hysteresis(&thin, 0.3, 0.8);
        assert_eq!(mask.data, vec![true, true, true, false, false, false]);
    }
}
