use super::{Component, ComponentState, KioskOrchestrator};
use std::collections::HashMap;
use tracing::debug;

impl KioskOrchestrator {
    /// Update component state
    pub async fn set_component_state(&self, component: Component, state: ComponentState) {
        debug!("Component {:?} state changed to: {:?}", component, state);
        self.component_states.lock().await.insert(component, state);
    }

    /// Get component state
    pub async fn get_component_state(&self, component: Component) -> Option<ComponentState> {
        self.component_states.lock().await.get(&component).cloned()
    }

    /// Snapshot of every registered component
    pub async fn get_all_component_states(&self) -> HashMap<Component, ComponentState> {
        self.component_states.lock().await.clone()
    }
}
