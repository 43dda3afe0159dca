use crate::dnd::geometry::Axis;
use serde::{Deserialize, Serialize};

/// The lists the engine drives. Each has its own gesture tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum ListKind {
    /// Files in the sidebar.
    Files,
    /// Notes of the open file. Notes are long blocks of text, so a drag
    /// needs a deliberate hold.
    Notes,
}

impl ListKind {
    /// Key under `window.ENV` holding this list's overrides.
    pub fn env_key(self) -> &'static str {
        match self {
            ListKind::Files => "DND",
            ListKind::Notes => "DND_NOTES",
        }
    }
}

/// Tunables for the drag gesture and its feedback.
///
/// Partial JSON is accepted: missing keys keep the list kind's defaults. The
/// app reads overrides from `window.ENV.DND` (files) and `window.ENV.DND_NOTES`
/// (notes), next to `window.ENV.API_URL`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub(crate) struct DragConfig {
    /// Stationary hold that turns a press into a drag.
    pub hold_threshold_ms: i64,
    /// Pointer travel (from the press point) that turns a press into a drag.
    pub move_tolerance_px: f64,
    /// Minimum spacing between hit-test passes while dragging.
    pub hover_sample_ms: i64,
    /// A session still open after this long is force-cleaned.
    pub session_timeout_ms: i64,
    /// Delay for the second, catch-stragglers cleanup after a drop.
    pub straggler_cleanup_ms: i64,
    /// Axis the sibling list is laid out along.
    pub axis: Axis,
    /// Opacity of the lifted row.
    pub dragged_opacity: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            hold_threshold_ms: 150,
            move_tolerance_px: 8.0,
            hover_sample_ms: 100,
            session_timeout_ms: 10_000,
            straggler_cleanup_ms: 100,
            axis: Axis::Vertical,
            dragged_opacity: 0.6,
        }
    }
}

impl DragConfig {
    pub fn defaults_for(kind: ListKind) -> Self {
        match kind {
            ListKind::Files => Self::default(),
            ListKind::Notes => Self {
                hold_threshold_ms: 500,
                move_tolerance_px: 5.0,
                ..Self::default()
            },
        }
    }

    #[cfg(test)]
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::from_json_value_for(ListKind::Files, value)
    }

    /// Overlay `value` on `kind`'s defaults.
    pub fn from_json_value_for(kind: ListKind, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let serde_json::Value::Object(overrides) = value else {
            return serde_json::from_value::<Self>(value).map(|c| c.validated_for(kind));
        };
        let mut merged = serde_json::to_value(Self::defaults_for(kind))?;
        if let serde_json::Value::Object(base) = &mut merged {
            base.extend(overrides);
        }
        serde_json::from_value::<Self>(merged).map(|c| c.validated_for(kind))
    }

    /// Read `kind`'s overrides from `window.ENV`; anything missing or malformed
    /// falls back to the kind's defaults.
    pub fn from_env(kind: ListKind) -> Self {
        let fallback = Self::defaults_for(kind);
        let Some(window) = web_sys::window() else {
            return fallback;
        };
        let Some(env) = window.get("ENV") else {
            return fallback;
        };
        if env.is_undefined() || !env.is_object() {
            return fallback;
        }

        let key = kind.env_key();
        let Ok(dnd) = js_sys::Reflect::get(&env, &key.into()) else {
            return fallback;
        };
        if dnd.is_undefined() || dnd.is_null() {
            return fallback;
        }

        let json = js_sys::JSON::stringify(&dnd)
            .ok()
            .and_then(|s| s.as_string())
            .unwrap_or_default();

        match serde_json::from_str::<serde_json::Value>(&json).map(|v| Self::from_json_value_for(kind, v)) {
            Ok(Ok(cfg)) => cfg,
            Ok(Err(e)) | Err(e) => {
                tracing::warn!(key, error = %e, "ignoring malformed drag config");
                fallback
            }
        }
    }

    /// Clamp values that would make the gesture unusable. Valid values are
    /// kept as they are, so a list's own defaults survive.
    pub fn validated(self) -> Self {
        self.validated_for(ListKind::Files)
    }

    fn validated_for(mut self, kind: ListKind) -> Self {
        let d = Self::defaults_for(kind);
        if self.hold_threshold_ms < 0 {
            self.hold_threshold_ms = d.hold_threshold_ms;
        }
        if !self.move_tolerance_px.is_finite() || self.move_tolerance_px < 0.0 {
            self.move_tolerance_px = d.move_tolerance_px;
        }
        if self.hover_sample_ms < 0 {
            self.hover_sample_ms = 0;
        }
        if self.session_timeout_ms <= 0 {
            self.session_timeout_ms = d.session_timeout_ms;
        }
        if self.straggler_cleanup_ms < 0 {
            self.straggler_cleanup_ms = d.straggler_cleanup_ms;
        }
        if !(0.0..=1.0).contains(&self.dragged_opacity) {
            self.dragged_opacity = d.dragged_opacity;
        }
        self
    }
}
