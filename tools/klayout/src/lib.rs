//! KLayout plugin: batch-mode DRC runsets and report databases.

use lazy_static::lazy_static;
use tera::Tera;

pub mod drc;
pub mod error;
pub mod rdb;
pub mod utils;

pub const TEMPLATES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates");

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        match Tera::new(&format!("{TEMPLATES_PATH}/*")) {
            Ok(t) => t,
            Err(e) => {
                panic!("Encountered errors while parsing Tera templates: {e}");
            }
        }
    };
}

/// The number of markers reported under one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCheck {
    pub name: String,
    pub num_results: u32,
}
