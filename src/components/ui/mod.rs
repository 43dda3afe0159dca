pub mod alert;
pub mod button;
pub mod drop_indicator;
pub mod spinner;

// Re-export component symbols so callers can `use crate::components::ui::Button` etc.
pub use alert::*;
pub use button::*;
pub use drop_indicator::*;
pub use spinner::*;
