use std::collections::HashMap;

use crate::core::common::Float;

/// Well-known setting keys. The renderer reads these through the typed
/// getters below; unknown keys are simply ignored.
pub mod keys {
    pub const WIDTH: &str = "image.width";
    pub const HEIGHT: &str = "image.height";
    pub const SAMPLES_PER_PIXEL: &str = "render.spp";
    pub const SEED: &str = "render.seed";
    pub const NUM_THREADS: &str = "render.threads";
    pub const BRIGHTNESS: &str = "sensor.brightness";
    pub const TIME_START: &str = "time.start";
    pub const TIME_END: &str = "time.end";
    pub const MAX_SNAPSHOTS: &str = "output.max_snapshots";
    pub const OUTPUT_DIR: &str = "output.dir";
}

#[derive(Debug, Clone)]
pub enum SettingValue {
    Int(i64),
    Float(Float),
    String(String),
}

/// Keyed configuration passed explicitly to the renderer; nothing in
/// the render path reads global state.
#[derive(Debug, Clone, Default)]
pub struct RenderSettings {
    values: HashMap<String, SettingValue>,
}

impl RenderSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_int(&mut self, key: &str, v: i64) -> &mut Self {
        self.values.insert(key.to_string(), SettingValue::Int(v));
        self
    }

    pub fn set_float(&mut self, key: &str, v: Float) -> &mut Self {
        self.values.insert(key.to_string(), SettingValue::Float(v));
        self
    }

    pub fn set_string(&mut self, key: &str, v: &str) -> &mut Self {
        self.values
            .insert(key.to_string(), SettingValue::String(v.to_string()));
        self
    }

    pub fn int(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(SettingValue::Int(v)) => *v,
            _ => default,
        }
    }

    pub fn float(&self, key: &str, default: Float) -> Float {
        match self.values.get(key) {
            Some(SettingValue::Float(v)) => *v,
            Some(SettingValue::Int(v)) => *v as Float,
            _ => default,
        }
    }

    pub fn string(&self, key: &str, default: &str) -> String {
        match self.values.get(key) {
            Some(SettingValue::String(v)) => v.clone(),
            _ => default.to_string(),
        }
    }

    pub fn width(&self) -> usize {
        self.int(keys::WIDTH, 256) as usize
    }

    pub fn height(&self) -> usize {
        self.int(keys::HEIGHT, 256) as usize
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.int(keys::SAMPLES_PER_PIXEL, 16) as u32
    }

    pub fn seed(&self) -> u32 {
        self.int(keys::SEED, 1_509_761_209) as u32
    }

    /// Worker count; debug builds collapse to one worker so failures
    /// replay identically.
    pub fn num_threads(&self) -> usize {
        if cfg!(debug_assertions) {
            return 1;
        }
        let n = self.int(keys::NUM_THREADS, 0);
        if n <= 0 {
            num_cpus::get()
        } else {
            n as usize
        }
    }

    pub fn brightness(&self) -> Float {
        self.float(keys::BRIGHTNESS, 1.0)
    }

    pub fn time_start(&self) -> Float {
        self.float(keys::TIME_START, 0.0)
    }

    pub fn time_end(&self) -> Float {
        self.float(keys::TIME_END, 0.0)
    }

    pub fn max_snapshots(&self) -> u32 {
        self.int(keys::MAX_SNAPSHOTS, 16) as u32
    }

    pub fn output_dir(&self) -> String {
        self.string(keys::OUTPUT_DIR, ".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_fall_back_to_defaults() {
        let mut s = RenderSettings::new();
        assert_eq!(s.width(), 256);
        s.set_int(keys::WIDTH, 640);
        assert_eq!(s.width(), 640);
        assert_eq!(s.float(keys::BRIGHTNESS, 2.0), 2.0);
    }

    #[test]
    fn int_coerces_to_float() {
        let mut s = RenderSettings::new();
        s.set_int(keys::BRIGHTNESS, 3);
        assert_eq!(s.brightness(), 3.0);
    }
}
