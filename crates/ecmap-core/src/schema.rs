//! Class-level (`ec`) and table-level (`db`) schema models.

pub mod db;

pub mod ec;
