mod builder;
mod config;
mod convert;
mod core;
mod handler;
mod ops;
mod payload;
mod position;
pub mod predicates;
mod replace;
pub mod rules;
mod schema;
mod snapshot;

pub use crate::builder::*;
pub use crate::config::*;
pub use crate::convert::*;
pub use crate::core::*;
pub use crate::handler::*;
pub use crate::ops::*;
pub use crate::payload::*;
pub use crate::position::*;
pub use crate::predicates::TitleContext;
pub use crate::replace::*;
pub use crate::rules::{DROP_RULES, PASTE_RULES, PasteRule, Plan, RuleContext, RuleId, evaluate};
pub use crate::schema::*;
pub use crate::snapshot::*;
