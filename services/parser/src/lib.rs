//! Parser - turns raw dataset bytes into tables and chart-ready pivots
//!
//! Pipeline: bytes -> [`csv_fallback`] / [`workbook`] -> [`Table`]
//! -> [`roles`] (which column is entity/year/value) -> [`aggregate`].
//!
//! Everything here is DETERMINISTIC: same bytes + same category = same output.

pub mod aggregate;
pub mod category;
pub mod csv_fallback;
pub mod error;
pub mod roles;
pub mod table;
pub mod workbook;

pub use aggregate::{PivotRow, PivotView, Reducer};
pub use category::{DatasetCategory, PivotShape};
pub use csv_fallback::parse_csv;
pub use error::ParseError;
pub use roles::{resolve_roles, Role, RoleCandidates, RoleMapping};
pub use table::{Cell, Table};
pub use workbook::parse_workbook;
