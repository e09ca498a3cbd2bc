use hecs::Entity;

/// Names one of the two model slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotId {
    Car,
    Platform,
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotId::Car => write!(f, "car"),
            SlotId::Platform => write!(f, "platform"),
        }
    }
}

/// Holds a model once it has loaded. Filled at most once, never emptied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModelSlot {
    #[default]
    Empty,
    Loaded(Entity),
}

impl ModelSlot {
    pub fn entity(&self) -> Option<Entity> {
        match self {
            ModelSlot::Empty => None,
            ModelSlot::Loaded(e) => Some(*e),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelSlot::Loaded(_))
    }

    /// Fills an empty slot. Returns false, leaving the slot untouched, if it
    /// was already occupied.
    pub(crate) fn occupy(&mut self, entity: Entity) -> bool {
        match self {
            ModelSlot::Empty => {
                *self = ModelSlot::Loaded(entity);
                true
            }
            ModelSlot::Loaded(_) => false,
        }
    }
}

/// An animated point light and the sphere that makes it visible.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightUnit {
    pub light: Entity,
    pub marker: Entity,
    /// Oscillation rate, fixed at creation.
    pub phase_speed: f32,
    /// Height the light oscillates around.
    pub baseline_y: f32,
}

impl LightUnit {
    /// Height of the light at wall-clock time `now_secs`.
    pub fn height_at(&self, now_secs: f64, amplitude: f32) -> f32 {
        let phase = now_secs * f64::from(self.phase_speed);
        self.baseline_y + phase.sin() as f32 * amplitude
    }
}

/// Which palette the lights currently show. Starts off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ToggleState(bool);

impl ToggleState {
    pub fn is_on(self) -> bool {
        self.0
    }

    /// Flips the state and returns the new value.
    pub(crate) fn flip(&mut self) -> bool {
        self.0 = !self.0;
        self.0
    }
}

/// Everything the frame loop and the pick handler mutate.
#[derive(Debug)]
pub struct SceneState {
    car: ModelSlot,
    platform: ModelSlot,
    lights: Vec<LightUnit>,
    toggle: ToggleState,
    button: Entity,
}

impl SceneState {
    /// State with both slots empty and the toggle off. `lights` is fixed
    /// from here on.
    pub fn new(lights: Vec<LightUnit>, button: Entity) -> Self {
        Self {
            car: ModelSlot::Empty,
            platform: ModelSlot::Empty,
            lights,
            toggle: ToggleState::default(),
            button,
        }
    }

    pub fn lights(&self) -> &[LightUnit] {
        &self.lights
    }

    pub fn slot(&self, id: SlotId) -> ModelSlot {
        match id {
            SlotId::Car => self.car,
            SlotId::Platform => self.platform,
        }
    }

    pub(crate) fn slot_mut(&mut self, id: SlotId) -> &mut ModelSlot {
        match id {
            SlotId::Car => &mut self.car,
            SlotId::Platform => &mut self.platform,
        }
    }

    pub fn toggle(&self) -> ToggleState {
        self.toggle
    }

    pub(crate) fn toggle_mut(&mut self) -> &mut ToggleState {
        &mut self.toggle
    }

    /// The only node clicks are tested against.
    pub fn button(&self) -> Entity {
        self.button
    }
}
