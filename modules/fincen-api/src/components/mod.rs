pub mod charts;
pub mod country_vector;
pub mod layout;
pub mod query_console;
pub mod statistics;
pub mod table;

pub use country_vector::{render_country_vector, CountryVectorData};
pub use layout::render_error;
pub use query_console::{render_query_console, QueryConsoleData};
pub use statistics::render_statistics;
