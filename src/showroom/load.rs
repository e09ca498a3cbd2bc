use hecs::Entity;

use super::Showroom;
use super::state::SlotId;
use crate::config::{ModelPlacement, ShowroomConfig};
use crate::loader::{LoadEvent, ModelRequest};
use crate::mesh::Transform;

/// The loads issued at startup, one per slot.
pub fn model_requests(config: &ShowroomConfig) -> [ModelRequest<SlotId>; 2] {
    [
        ModelRequest::new(SlotId::Car, &config.assets.car, "car").color(config.car.color),
        ModelRequest::new(SlotId::Platform, &config.assets.platform, "platform")
            .color(config.platform.color),
    ]
}

/// Places finished models into their slots.
#[derive(Clone, Copy, Debug)]
pub struct LoadHandler {
    car: ModelPlacement,
    platform: ModelPlacement,
}

impl LoadHandler {
    pub fn new(config: &ShowroomConfig) -> Self {
        Self {
            car: config.car,
            platform: config.platform,
        }
    }

    fn placement(&self, slot: SlotId) -> &ModelPlacement {
        match slot {
            SlotId::Car => &self.car,
            SlotId::Platform => &self.platform,
        }
    }

    /// Applies one loader event. Returns the model's root node when a slot
    /// was filled.
    ///
    /// Failures are logged and leave the slot empty for good.
    pub fn handle<K>(&self, showroom: &mut Showroom<K>, event: LoadEvent<SlotId>) -> Option<Entity> {
        match event {
            LoadEvent::Progress {
                slot,
                loaded,
                total,
            } => {
                let percent = if total > 0 {
                    loaded as f64 / total as f64 * 100.0
                } else {
                    100.0
                };
                log::info!("{} model {:.0}% loaded", slot, percent);
                None
            }
            LoadEvent::Failed { slot, error } => {
                log::error!("Error loading {} model: {}", slot, error);
                None
            }
            LoadEvent::Loaded { slot, asset } => {
                if showroom.state.slot(slot).is_loaded() {
                    log::warn!("Ignoring second {} model, slot already filled", slot);
                    return None;
                }

                let placement = self.placement(slot);
                let root = showroom.scene.instantiate(asset.root, None);
                if let Some(mut transform) = showroom.scene.transform_mut(root) {
                    *transform = Transform::new()
                        .position(placement.position)
                        .rotation(placement.rotation)
                        .uniform_scale(placement.scale);
                }
                showroom
                    .scene
                    .configure_meshes(root, placement.shadows, placement.fog);
                showroom.state.slot_mut(slot).occupy(root);

                log::info!("{} model loaded", slot);
                Some(root)
            }
        }
    }
}
