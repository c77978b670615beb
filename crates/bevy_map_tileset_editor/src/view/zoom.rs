//! Discrete zoom levels with fine wheel and pinch control

/// Zoom levels stepped through by zoom in/out
pub const ZOOM_FACTORS: [f32; 25] = [
    0.015625, 0.03125, 0.0625, 0.125, 0.25, 0.33, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 4.0, 5.5, 8.0,
    11.0, 16.0, 23.0, 32.0, 45.0, 64.0, 90.0, 128.0, 180.0, 256.0,
];

/// One wheel notch in angle-delta units
pub const WHEEL_STEP: f32 = 120.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Zoomable {
    scale: f32,
    gesture_start_scale: Option<f32>,
}

impl Default for Zoomable {
    fn default() -> Self {
        Self {
            scale: 1.0,
            gesture_start_scale: None,
        }
    }
}

impl Zoomable {
    pub fn new(scale: f32) -> Self {
        let mut zoomable = Self::default();
        zoomable.set_scale(scale);
        zoomable
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Set the scale, clamped to the supported range. Returns true if it changed.
    pub fn set_scale(&mut self, scale: f32) -> bool {
        let scale = clamp_scale(scale);
        if (scale - self.scale).abs() < f32::EPSILON {
            return false;
        }
        self.scale = scale;
        true
    }

    pub fn can_zoom_in(&self) -> bool {
        self.scale < ZOOM_FACTORS[ZOOM_FACTORS.len() - 1]
    }

    pub fn can_zoom_out(&self) -> bool {
        self.scale > ZOOM_FACTORS[0]
    }

    /// Step to the next larger zoom factor
    pub fn zoom_in(&mut self) -> bool {
        match ZOOM_FACTORS.iter().find(|f| **f > self.scale) {
            Some(factor) => self.set_scale(*factor),
            None => false,
        }
    }

    /// Step to the next smaller zoom factor
    pub fn zoom_out(&mut self) -> bool {
        match ZOOM_FACTORS.iter().rev().find(|f| **f < self.scale) {
            Some(factor) => self.set_scale(*factor),
            None => false,
        }
    }

    pub fn reset_zoom(&mut self) -> bool {
        self.set_scale(1.0)
    }

    /// Apply a vertical wheel delta in angle units (120 per notch).
    ///
    /// Whole notches step through the zoom factors; high-resolution wheels
    /// scale continuously.
    pub fn handle_wheel_delta(&mut self, delta: f32) -> bool {
        if delta <= -WHEEL_STEP {
            return self.zoom_out();
        }
        if delta >= WHEEL_STEP {
            return self.zoom_in();
        }
        if delta == 0.0 {
            return false;
        }

        let mut factor = 1.0 + 0.3 * delta.abs() / WHEEL_STEP;
        if delta < 0.0 {
            factor = 1.0 / factor;
        }
        let scale = clamp_scale(self.scale * factor);
        self.set_scale(round_scale(scale))
    }

    /// Multiply the scale by a pinch or trackpad zoom factor
    pub fn handle_zoom_delta(&mut self, factor: f32) -> bool {
        if factor <= 0.0 || factor == 1.0 {
            return false;
        }
        self.set_scale(round_scale(self.scale * factor))
    }

    /// Start a pinch gesture; later updates are relative to this scale
    pub fn begin_gesture(&mut self) {
        self.gesture_start_scale = Some(self.scale);
    }

    /// Update a pinch gesture with its total scale factor since it began
    pub fn update_gesture(&mut self, total_factor: f32) -> bool {
        let start = *self.gesture_start_scale.get_or_insert(self.scale);
        self.set_scale(round_scale(start * total_factor))
    }

    pub fn end_gesture(&mut self) {
        self.gesture_start_scale = None;
    }
}

fn clamp_scale(scale: f32) -> f32 {
    scale.clamp(ZOOM_FACTORS[0], ZOOM_FACTORS[ZOOM_FACTORS.len() - 1])
}

/// At most four digits after the decimal point
fn round_scale(scale: f32) -> f32 {
    (scale * 10000.0 + 0.5).floor() / 10000.0
}
