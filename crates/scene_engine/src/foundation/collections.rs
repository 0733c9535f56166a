//! Specialized collection types

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable key of a game object inside its owning scene
    pub struct ObjectId;
}
