//! Flowdeploy Source
//!
//! Finds flow files in a source tree and loads the flow each one defines.
//!
//! Layout contract:
//! ```text
//! flows/
//! ├── hello_world.yaml          one flow
//! ├── mod.yaml                  ignored
//! ├── README.md                 ignored
//! └── examples/
//!     └── s3_download_flow.yaml one flow
//! ```
//!
//! Every flow file must define exactly one flow. Zero or several is an error.

mod discovery;
mod error;
mod extract;

pub use discovery::{FlowFiles, SourceFilter, discover};
pub use error::{DiscoveryError, ExtractError};
pub use extract::extract_flow;
