//! The session object tree.
//!
//! Every entity the daemon exposes is a [`Node`] in a single tree rooted at
//! the process-wide [`Session`]. Nodes answer a uniform CRUD verb set;
//! containers hold name-indexed children, leaves carry typed values backed
//! by the engine. Path resolution hands out `Arc` references, so a node
//! observed by one client stays valid while another client deletes it from
//! its parent.
//!
//! Tree shape:
//!
//! ```text
//! /                    Session (singleton root)
//! ├── pipelines        create/delete pipelines
//! │   └── <p>
//! │       ├── elements
//! │       │   └── <e>
//! │       │       ├── properties/<prop>
//! │       │       ├── signals/<sig>/timeout
//! │       │       └── actions/<action>
//! │       ├── bus      message / timeout / types
//! │       ├── state
//! │       └── event
//! └── debug            enable / color / threshold / reset
//! ```

pub mod action;
pub mod bus;
pub mod debug;
pub mod element;
pub mod event;
pub mod node;
pub mod path;
pub mod pipeline;
pub mod pipelines;
pub mod property;
pub mod session;
pub mod signal;
pub mod state;

pub use node::Node;
pub use path::resolve;
pub use pipeline::Pipeline;
pub use pipelines::Pipelines;
pub use session::Session;
