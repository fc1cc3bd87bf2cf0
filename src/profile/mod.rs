pub mod combine;
pub mod level;
pub mod matrix;
pub mod table_io;

pub use combine::{combine_bracken, combine_profiles, read_bracken, read_profile};
pub use level::extract_level;
pub use matrix::{ProfileMatrix, SampleProfile};
pub use table_io::{read_profile_table, write_profile_table};
