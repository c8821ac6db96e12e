#[macro_use]
extern crate lazy_static;

pub mod api;
pub mod model;

pub use api::{api, list_cups, login, meter_info, Error, LoginStep};
