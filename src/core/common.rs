pub type Float = f32;

pub const PI: Float = 3.14159265358979323846;
pub const PI_OVER2: Float = 1.57079632679489661923;
pub const PI_OVER4: Float = 0.78539816339744830961;
pub const INV_PI: Float = 0.31830988618379067154;
pub const INFINITY: Float = std::f32::INFINITY;

pub fn clamp<T>(val: T, low: T, high: T) -> T
where
    T: PartialOrd,
{
    if val < low {
        low
    } else if val > high {
        high
    } else {
        val
    }
}

pub fn lerp(t: Float, x: Float, y: Float) -> Float {
    x * (1.0 - t) + y * t
}

#[inline(always)]
pub fn radians(deg: Float) -> Float {
    (PI / 180.0) * deg
}

pub fn gamma_correct(value: Float) -> Float {
    if value <= 0.0031308 {
        return 12.92 * value;
    }

    1.055 * value.powf(1.0 / 2.4) - 0.055
}

/// Kahan-compensated accumulator. The MIS reciprocal sum adds many
/// squared PDF ratios of wildly different magnitude; plain f32
/// accumulation loses the small terms.
#[derive(Debug, Default, Copy, Clone)]
pub struct CompensatedSum {
    sum: Float,
    comp: Float,
}

impl CompensatedSum {
    pub fn new(v: Float) -> Self {
        Self { sum: v, comp: 0.0 }
    }

    pub fn add(&mut self, v: Float) {
        let y = v - self.comp;
        let t = self.sum + y;
        self.comp = (t - self.sum) - y;
        self.sum = t;
    }

    pub fn value(&self) -> Float {
        self.sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compensated_sum_keeps_small_terms() {
        let mut s = CompensatedSum::new(0.0);
        for _ in 0..10_000 {
            s.add(1.0e-4);
        }
        s.add(1.0e4);
        assert!((s.value() - 1.0001e4).abs() < 0.5);
    }
}
