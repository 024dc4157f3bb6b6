use std::collections::BTreeMap;

use hb_core::{BridgeError, WidgetHandle, WidgetId};
use hb_ui::{Frame, LifecycleError, WidgetKind, WidgetState};

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetRecord {
    pub kind: WidgetKind,
    pub state: WidgetState,
    pub frame: Frame,
    pub name: Option<String>,
}

impl WidgetRecord {
    pub fn handle(&self, id: WidgetId) -> WidgetHandle {
        WidgetHandle {
            id,
            width: self.frame.width,
            height: self.frame.height,
        }
    }
}

/// Every widget the bridge has asked the platform to create.
#[derive(Debug, Default)]
pub struct WidgetTable {
    records: BTreeMap<WidgetId, WidgetRecord>,
}

impl WidgetTable {
    pub fn create(
        &mut self,
        id: WidgetId,
        kind: WidgetKind,
        frame: Frame,
        name: Option<String>,
    ) -> Result<(), LifecycleError> {
        let state = self
            .records
            .get(&id)
            .map(|record| record.state)
            .unwrap_or(WidgetState::Unborn)
            .advance(id, WidgetState::Created)?;
        self.records.insert(
            id,
            WidgetRecord {
                kind,
                state,
                frame,
                name,
            },
        );
        Ok(())
    }

    pub fn place(&mut self, id: WidgetId, frame: Frame) -> Result<(), BridgeError> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or(BridgeError::UnknownWidget { id })?;
        // Repositioning an already placed widget just moves it.
        if record.state != WidgetState::Placed {
            record.state = record
                .state
                .advance(id, WidgetState::Placed)
                .map_err(|error| BridgeError::Eval(error.to_string()))?;
        }
        record.frame = frame;
        Ok(())
    }

    pub fn destroy(&mut self, id: WidgetId) -> Result<(), BridgeError> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or(BridgeError::UnknownWidget { id })?;
        record.state = record
            .state
            .advance(id, WidgetState::Destroyed)
            .map_err(|error| BridgeError::Eval(error.to_string()))?;
        Ok(())
    }

    pub fn get(&self, id: WidgetId) -> Option<&WidgetRecord> {
        self.records.get(&id)
    }

    /// Most recently created widget carrying `name`.
    pub fn find_by_name(&self, name: &str) -> Option<(WidgetId, &WidgetRecord)> {
        self.records
            .iter()
            .rev()
            .find(|(_, record)| record.name.as_deref() == Some(name))
            .map(|(id, record)| (*id, record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
