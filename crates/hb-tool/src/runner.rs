use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use hb_api::{Bridge, BridgeOptions, EchoHost, HalEvent, HostRef, Program, RecordingHal, Value};

use crate::source::{read_script, read_test_case};
use crate::{HbToolError, TestAction, TestCase};

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub status: i32,
    pub events: Vec<HalEvent>,
    pub callbacks: Vec<Vec<Value>>,
    pub consumed_actions: usize,
}

fn event_id(event: &mut HalEvent) -> Option<&mut i64> {
    match event {
        HalEvent::Button { id, .. }
        | HalEvent::Label { id, .. }
        | HalEvent::Input { id, .. }
        | HalEvent::Table { id, .. }
        | HalEvent::Place { id, .. }
        | HalEvent::SetText { id, .. } => Some(id),
        HalEvent::Window { .. } | HalEvent::Read { .. } | HalEvent::Print { .. } => None,
    }
}

/// Widget ids come from a process-wide counter, so recorded runs renumber
/// them 1, 2, 3... in order of first appearance.
pub fn normalize_widget_ids(events: &mut [HalEvent]) {
    let mut seen = BTreeMap::new();
    for event in events {
        if let Some(id) = event_id(event) {
            let next = seen.len() as i64 + 1;
            *id = *seen.entry(*id).or_insert(next);
        }
    }
}

pub fn run_case(case_dir: &Path, case: &TestCase) -> Result<RunReport, HbToolError> {
    let source = read_script(case_dir, case)?;
    let hal = Rc::new(RefCell::new(RecordingHal::new().with_assets_dir(case_dir)));
    let host = Rc::new(RefCell::new(EchoHost::default()));
    let bridge = Bridge::new(BridgeOptions {
        callback: Some(HostRef::new(Rc::clone(&host))),
        exposed_name: Some(case.callback_name.clone()),
        hal: Some(hal.clone()),
        ..BridgeOptions::default()
    })?;

    let status = bridge.eval(Program::Bytes(source));

    for (action_index, action) in case.actions.iter().enumerate() {
        let name = action.target();
        let widget = bridge
            .find_widget(name)
            .ok_or_else(|| HbToolError::UnknownWidget {
                action_index,
                name: name.to_string(),
            })?;
        let dispatched = match action {
            TestAction::Click { .. } => bridge.dispatch(widget.id),
            TestAction::Event { payload, .. } => bridge.dispatch_event(widget.id, payload.clone()),
        };
        match dispatched {
            None => {
                return Err(HbToolError::ActionUnbound {
                    action_index,
                    name: name.to_string(),
                })
            }
            Some(0) => {}
            Some(status) => {
                return Err(HbToolError::ActionFailed {
                    action_index,
                    name: name.to_string(),
                    status,
                })
            }
        }
    }

    let mut events = hal.borrow_mut().take_events();
    normalize_widget_ids(&mut events);
    let callbacks = host.borrow_mut().take_calls();
    Ok(RunReport {
        status,
        events,
        callbacks,
        consumed_actions: case.actions.len(),
    })
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, HbToolError> {
    serde_json::to_string(value).map_err(HbToolError::Serialize)
}

pub fn assert_case(case_dir: &Path, case_path: &Path) -> Result<RunReport, HbToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(case_dir, &case)?;

    if report.status != case.expected_status {
        return Err(HbToolError::StatusMismatch {
            expected: case.expected_status,
            actual: report.status,
        });
    }

    if report.events.len() != case.expected_events.len() {
        let observed =
            serde_json::to_string_pretty(&report.events).map_err(HbToolError::Serialize)?;
        return Err(HbToolError::EventCountMismatch {
            expected: case.expected_events.len(),
            actual: report.events.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_events
        .iter()
        .zip(report.events.iter())
        .enumerate()
    {
        if expected != actual {
            return Err(HbToolError::EventMismatch {
                index,
                expected: to_json(expected)?,
                actual: to_json(actual)?,
            });
        }
    }

    if let Some(expected) = &case.expected_callbacks {
        if expected != &report.callbacks {
            return Err(HbToolError::CallbackMismatch {
                expected: to_json(expected)?,
                actual: to_json(&report.callbacks)?,
            });
        }
    }

    Ok(report)
}
