//! Toolkit-neutral input for the tileset view
//!
//! [`TilesetView`](super::TilesetView) consumes [`ViewEvent`]s so its
//! interaction logic runs without an egui context. [`InputTracker`]
//! produces them from egui's raw events each frame.

use bevy::math::Vec2;
use bevy_egui::egui;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Ctrl, or Cmd on macOS
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
        alt: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        ctrl: false,
        shift: true,
        alt: false,
    };

    pub const ALT: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: true,
    };
}

impl From<egui::Modifiers> for Modifiers {
    fn from(m: egui::Modifiers) -> Self {
        Self {
            ctrl: m.ctrl || m.command,
            shift: m.shift,
            alt: m.alt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

impl PointerButton {
    fn from_egui(button: egui::PointerButton) -> Option<Self> {
        match button {
            egui::PointerButton::Primary => Some(PointerButton::Primary),
            egui::PointerButton::Secondary => Some(PointerButton::Secondary),
            egui::PointerButton::Middle => Some(PointerButton::Middle),
            _ => None,
        }
    }
}

/// Keys the view reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKey {
    Z,
    X,
    Y,
    A,
    /// `=` or `+`
    Equals,
    Minus,
    Zero,
    Up,
    Down,
    Left,
    Right,
    Space,
    Escape,
}

impl ViewKey {
    fn from_egui(key: egui::Key) -> Option<Self> {
        Some(match key {
            egui::Key::Z => ViewKey::Z,
            egui::Key::X => ViewKey::X,
            egui::Key::Y => ViewKey::Y,
            egui::Key::A => ViewKey::A,
            egui::Key::Equals | egui::Key::Plus => ViewKey::Equals,
            egui::Key::Minus => ViewKey::Minus,
            egui::Key::Num0 => ViewKey::Zero,
            egui::Key::ArrowUp => ViewKey::Up,
            egui::Key::ArrowDown => ViewKey::Down,
            egui::Key::ArrowLeft => ViewKey::Left,
            egui::Key::ArrowRight => ViewKey::Right,
            egui::Key::Space => ViewKey::Space,
            egui::Key::Escape => ViewKey::Escape,
            _ => return None,
        })
    }
}

/// Input delivered to the view. Positions are relative to the viewport's
/// top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewEvent {
    PointerMoved {
        pos: Vec2,
        modifiers: Modifiers,
    },
    PointerPressed {
        pos: Vec2,
        button: PointerButton,
        modifiers: Modifiers,
    },
    PointerReleased {
        pos: Vec2,
        button: PointerButton,
        modifiers: Modifiers,
    },
    PointerLeft,
    /// `pixels` scrolls the content; `angle` drives wheel zoom (120 per notch)
    Wheel {
        pos: Vec2,
        pixels: Vec2,
        angle: f32,
        modifiers: Modifiers,
    },
    /// Pinch or trackpad zoom by a factor
    Zoom {
        pos: Vec2,
        factor: f32,
    },
    KeyPressed {
        key: ViewKey,
        modifiers: Modifiers,
    },
    KeyReleased {
        key: ViewKey,
        modifiers: Modifiers,
    },
    ViewportResized(Vec2),
}

/// Pixels scrolled per wheel line
const LINE_SCROLL: f32 = 40.0;

/// Turns egui's per-frame input into [`ViewEvent`]s for one viewport
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    viewport: Option<egui::Rect>,
    hovering: bool,
    pressed: Vec<PointerButton>,
    last_pointer: Option<Vec2>,
}

impl InputTracker {
    /// Events for this frame. Presses must start inside the viewport;
    /// moves and releases follow a held button outside of it.
    pub fn collect(&mut self, ui: &egui::Ui, response: &egui::Response) -> Vec<ViewEvent> {
        let rect = response.rect;
        let mut events = Vec::new();

        if self.viewport.map(|r| r.size()) != Some(rect.size()) {
            events.push(ViewEvent::ViewportResized(Vec2::new(rect.width(), rect.height())));
        }
        self.viewport = Some(rect);

        let local = |pos: egui::Pos2| Vec2::new(pos.x - rect.min.x, pos.y - rect.min.y);
        let accepts_keys = response.has_focus() || response.hovered();
        let (raw_events, current_modifiers) = ui.input(|i| (i.events.clone(), i.modifiers));

        for event in raw_events {
            match event {
                egui::Event::PointerMoved(pos) => {
                    let inside = rect.contains(pos);
                    if inside || !self.pressed.is_empty() {
                        self.hovering = inside;
                        self.last_pointer = Some(local(pos));
                        events.push(ViewEvent::PointerMoved {
                            pos: local(pos),
                            modifiers: current_modifiers.into(),
                        });
                    } else if self.hovering {
                        self.hovering = false;
                        events.push(ViewEvent::PointerLeft);
                    }
                }
                egui::Event::PointerButton {
                    pos,
                    button,
                    pressed,
                    modifiers,
                    ..
                } => {
                    let Some(button) = PointerButton::from_egui(button) else {
                        continue;
                    };
                    if pressed {
                        if rect.contains(pos) && !self.pressed.contains(&button) {
                            self.pressed.push(button);
                            events.push(ViewEvent::PointerPressed {
                                pos: local(pos),
                                button,
                                modifiers: modifiers.into(),
                            });
                        }
                    } else if let Some(index) = self.pressed.iter().position(|b| *b == button) {
                        self.pressed.remove(index);
                        events.push(ViewEvent::PointerReleased {
                            pos: local(pos),
                            button,
                            modifiers: modifiers.into(),
                        });
                    }
                }
                egui::Event::PointerGone => {
                    if self.hovering {
                        self.hovering = false;
                        events.push(ViewEvent::PointerLeft);
                    }
                }
                egui::Event::MouseWheel {
                    unit,
                    delta,
                    modifiers,
                    ..
                } => {
                    if !self.hovering {
                        continue;
                    }
                    let (pixels, angle) = match unit {
                        egui::MouseWheelUnit::Point => (delta, delta.y),
                        egui::MouseWheelUnit::Line => (delta * LINE_SCROLL, delta.y * 120.0),
                        egui::MouseWheelUnit::Page => (delta * rect.height(), delta.y * 120.0),
                    };
                    events.push(ViewEvent::Wheel {
                        pos: self.last_pointer.unwrap_or_default(),
                        pixels: Vec2::new(pixels.x, pixels.y),
                        angle,
                        modifiers: modifiers.into(),
                    });
                }
                egui::Event::Zoom(factor) => {
                    if self.hovering {
                        events.push(ViewEvent::Zoom {
                            pos: self.last_pointer.unwrap_or_default(),
                            factor,
                        });
                    }
                }
                egui::Event::Key {
                    key,
                    pressed,
                    modifiers,
                    ..
                } => {
                    if !accepts_keys {
                        continue;
                    }
                    let Some(key) = ViewKey::from_egui(key) else {
                        continue;
                    };
                    let modifiers = modifiers.into();
                    events.push(if pressed {
                        ViewEvent::KeyPressed { key, modifiers }
                    } else {
                        ViewEvent::KeyReleased { key, modifiers }
                    });
                }
                _ => {}
            }
        }

        events
    }
}
