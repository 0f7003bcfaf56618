pub mod app_record;
pub mod app_state;
pub mod status;
pub mod theme;

pub use app_record::{AppDraft, AppMode, AppRecord, DraftErrors, DraftField, ICON_OPTIONS};
pub use app_state::AppState;
pub use status::{ApiHealth, DisplayStatus, PingResponse, ProbeOutcome, TileStatus};
pub use theme::ThemeMode;
