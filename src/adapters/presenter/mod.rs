//! Field Presenter Adapters
//!
//! - **MarkdownPresenter** - Default chat prompts
//! - **PresenterRegistry** - Per-(record type, field) overrides

mod markdown_presenter;
mod presenter_registry;

pub use markdown_presenter::MarkdownPresenter;
pub use presenter_registry::PresenterRegistry;
