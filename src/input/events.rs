use crate::core::{
    geo::{PixelPoint, Point},
    view::View,
};
use crate::prelude::{HashMap, VecDeque};
use serde::{Deserialize, Serialize};

/// Raw input delivered by the host. Positions are canvas CSS pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerDown {
        position: PixelPoint,
        #[serde(default)]
        button: PointerButton,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerMove {
        position: PixelPoint,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerUp {
        position: PixelPoint,
        #[serde(default)]
        button: PointerButton,
        #[serde(default)]
        modifiers: Modifiers,
    },
    /// Scroll wheel or trackpad scroll. Positive `delta_y` scrolls down.
    Wheel {
        position: PixelPoint,
        delta_y: f64,
        #[serde(default)]
        mode: WheelMode,
        #[serde(default)]
        modifiers: Modifiers,
    },
    DoubleClick {
        position: PixelPoint,
        #[serde(default)]
        modifiers: Modifiers,
    },
    /// Canvas resize, in CSS pixels
    Resize { size: Point },
}

/// Keyboard modifiers held during a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
    Other(u16),
}

/// Unit of a wheel delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WheelMode {
    #[default]
    Pixel,
    Line,
}

impl InputEvent {
    pub fn pointer_down(position: impl Into<PixelPoint>) -> Self {
        InputEvent::PointerDown {
            position: position.into(),
            button: PointerButton::Primary,
            modifiers: Modifiers::default(),
        }
    }

    pub fn pointer_move(position: impl Into<PixelPoint>) -> Self {
        InputEvent::PointerMove {
            position: position.into(),
            modifiers: Modifiers::default(),
        }
    }

    pub fn pointer_up(position: impl Into<PixelPoint>) -> Self {
        InputEvent::PointerUp {
            position: position.into(),
            button: PointerButton::Primary,
            modifiers: Modifiers::default(),
        }
    }

    pub fn wheel(position: impl Into<PixelPoint>, delta_y: f64) -> Self {
        InputEvent::Wheel {
            position: position.into(),
            delta_y,
            mode: WheelMode::Pixel,
            modifiers: Modifiers::default(),
        }
    }

    pub fn double_click(position: impl Into<PixelPoint>) -> Self {
        InputEvent::DoubleClick {
            position: position.into(),
            modifiers: Modifiers::default(),
        }
    }

    /// Gets the pointer position associated with this event, if any
    pub fn position(&self) -> Option<PixelPoint> {
        match self {
            InputEvent::PointerDown { position, .. }
            | InputEvent::PointerMove { position, .. }
            | InputEvent::PointerUp { position, .. }
            | InputEvent::Wheel { position, .. }
            | InputEvent::DoubleClick { position, .. } => Some(*position),
            InputEvent::Resize { .. } => None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            InputEvent::PointerDown { modifiers, .. }
            | InputEvent::PointerMove { modifiers, .. }
            | InputEvent::PointerUp { modifiers, .. }
            | InputEvent::Wheel { modifiers, .. }
            | InputEvent::DoubleClick { modifiers, .. } => *modifiers,
            InputEvent::Resize { .. } => Modifiers::default(),
        }
    }
}

/// Events emitted by the map
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The view was replaced
    ViewChanged { view: View },
    /// The pointer entered a marker
    MarkerOver { layer_id: String, marker_id: String },
    /// The pointer left the marker it was over
    MarkerLeave { layer_id: String, marker_id: String },
    MarkerClick { layer_id: String, marker_id: String },
}

impl MapEvent {
    /// Name listeners register under
    pub fn kind(&self) -> &'static str {
        match self {
            MapEvent::ViewChanged { .. } => "view.changed",
            MapEvent::MarkerOver { .. } => "marker.over",
            MapEvent::MarkerLeave { .. } => "marker.leave",
            MapEvent::MarkerClick { .. } => "marker.click",
        }
    }
}

/// Event listener callback type
pub type EventCallback = Box<dyn Fn(&MapEvent) + Send + Sync>;

/// Queues map events and dispatches them to listeners by kind
#[derive(Default)]
pub struct EventManager {
    listeners: HashMap<String, Vec<EventCallback>>,
    event_queue: VecDeque<MapEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event listener
    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.listeners
            .entry(event_type.to_string())
            .or_default()
            .push(Box::new(callback));
    }

    /// Emit an event to the queue
    pub fn emit(&mut self, event: MapEvent) {
        self.event_queue.push_back(event);
    }

    /// Dispatches all queued events and returns them
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        let events: Vec<_> = self.event_queue.drain(..).collect();

        for event in &events {
            if let Some(callbacks) = self.listeners.get(event.kind()) {
                for callback in callbacks {
                    callback(event);
                }
            }
        }

        events
    }

    pub fn clear_events(&mut self) {
        self.event_queue.clear();
    }

    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }
}
