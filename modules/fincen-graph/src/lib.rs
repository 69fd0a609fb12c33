pub mod aggregate;
pub mod client;
pub mod gateway;
pub mod projection;
pub mod reader;
pub mod tabulate;

#[cfg(any(test, feature = "test-utils"))]
pub mod testutil;

pub use client::GraphClient;
pub use gateway::{GraphGateway, ParamValue, Params};
pub use reader::{
    CountryVectorView, DashboardReader, StatisticsView, ViewError, DEFAULT_CONSOLE_QUERY,
};
pub use tabulate::tabulate;
