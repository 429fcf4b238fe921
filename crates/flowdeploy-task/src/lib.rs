//! Flowdeploy Task
//!
//! Task implementations used inside flows:
//! - [`StepActivate`]: start an AWS Step Functions execution
//! - [`S3Download`]: fetch an object from S3
//! - [`Log`]: emit a log line
//!
//! Every task keeps construction-time defaults for its parameters. Values
//! passed when it runs take precedence, see [`params::resolve`].

pub mod aws;
pub mod credentials;
mod error;
mod execute;
mod log;
pub mod params;
mod s3_download;
mod sfn;
pub mod sigv4;
mod step_activate;
mod types;

pub use aws::AwsCredentials;
pub use credentials::CredentialChain;
pub use error::TaskError;
pub use execute::execute;
pub use log::Log;
pub use s3_download::{DownloadParams, S3Download};
pub use sfn::{SfnClient, StartExecutionRequest, StepFunctions};
pub use step_activate::{ExecutionParams, StepActivate};
pub use types::{Task, TaskContext, TaskOutput};
