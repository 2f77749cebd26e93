// Conversion engine - independent of the command line

pub mod backend;
pub mod batch;
pub mod codec;
pub mod container;
pub mod convert;
pub mod core;
pub mod error;
pub mod filter;
pub mod hardware;
pub mod probe;
pub mod progress;
pub mod settings;

pub use backend::{BackendTag, BackendTarget, resolve_backend};
pub use batch::{BatchReport, BatchRunner, ErrorMode, FileContext, StepProgress};
pub use container::{Container, ContainerFormat};
pub use convert::{ConvertOptions, check_batch, convert_batch, plan_batch};
pub use core::*;
pub use error::{ConvertError, Result};
pub use progress::ProgressManager;
pub use settings::{BitrateSplit, Settings};
