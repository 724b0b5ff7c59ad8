//! Kiln Elements
//!
//! Lifecycle engine for attribute-driven custom elements. A widget
//! implements [`Component`]; [`CustomElement`] registers it with a
//! [`Document`](kiln_dom::Document), renders it once on first connection
//! and coalesces observed attribute changes into one batched update per
//! animation frame.
//!
//! ```ignore
//! struct Badge;
//!
//! impl Component for Badge {
//!     fn local_name() -> &'static str { "badge" }
//!     fn create(_host: &Host) -> Self { Badge }
//! }
//!
//! let doc = Document::new();
//! CustomElement::<Badge>::define_once(&doc);
//! let badge = CustomElement::<Badge>::create(&doc)?;
//! ```

pub mod config;
pub mod logging;

mod component;
mod data_store;
mod error;
mod frame;
mod host;
mod lifecycle;
mod scheduler;
mod states;

pub use component::{AttributeUpdate, Component};
pub use data_store::DataStore;
pub use error::{ElementError, Result};
pub use frame::{FrameLoop, request_animation_frame, run_frame};
pub use host::{Content, ElementSpec, Host, WeakHost};
pub use lifecycle::{CustomElement, PendingAttribute, create_element};
pub use scheduler::{ArrayScheduler, AttributeScheduler, Batch, Delivery, Scheduler};
pub use states::CustomStates;

pub use kiln_dom as dom;
pub use kiln_html as html;
