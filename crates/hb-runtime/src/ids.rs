use std::sync::atomic::{AtomicI64, Ordering};

use hb_core::WidgetId;

pub const FIRST_WIDGET_ID: i64 = 1001;

static NEXT_WIDGET_ID: AtomicI64 = AtomicI64::new(FIRST_WIDGET_ID);

/// Next process-wide widget id. Ids are never reused, even across bridges.
pub fn next_widget_id() -> WidgetId {
    WidgetId(NEXT_WIDGET_ID.fetch_add(1, Ordering::Relaxed))
}
