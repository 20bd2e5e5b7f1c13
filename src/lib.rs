#![deny(clippy::all, clippy::pedantic, clippy::perf, clippy::suspicious)] // Catch correctness + perf + suspicious patterns early.
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc
)]

//! Dynamic call-site binding: member lookup, conversions, overload resolution and
//! guarded rule construction for operations whose operand types are only known at
//! run time.

pub mod binder;
pub mod binder_config;
pub mod catalog;
pub mod conversions;
pub mod diagnostics;
pub mod error;
pub mod fusion;
pub mod ir;
pub mod logging;
pub mod metadata;
pub mod overloads;
pub mod types;

pub use binder::{
    BinderAction, ConditionalBuilder, DefaultBinder, ErrorPolicy, FailureMode, Introspected, Operator,
};
pub use binder_config::BinderConfig;
pub use catalog::{Catalog, MemberDescriptor, MemberKind, MemberRef};
pub use conversions::{ConversionMode, ConversionRank, ConversionResolver};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::{Error, Result};
pub use ir::{BoundRule, BoundValue, Expr, Guard, GuardSet, Outcome};
pub use metadata::{HostRegistry, MetadataProvider};
pub use overloads::{ArgKind, BindingTarget, CallShape, NarrowingLevel, OverloadResolver};
pub use types::{ConstValue, Primitive, Ty, TypeId, Value};
