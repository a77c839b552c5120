//! HTTP API adapter.
//!
//! Inbound adapter serving the cached quote set.
//!
//! # Endpoints
//!
//! - `GET /` - Welcome message with a link to the API index
//! - `GET /api/` - API index with absolute endpoint links
//! - `GET /api/crypto-prices/` - Quote set as JSON
//! - `GET /api/crypto-chart/` - Quote set as an HTML bar chart
//!
//! Health and metrics routes are merged in from the `health` module.
//! Every route also answers without its trailing slash.

mod chart;
mod controller;
mod response;
mod server;

pub use chart::{CHART_TITLE, escape_html, format_price, render_chart_page, render_error_page};
pub use controller::{AppState, create_router};
pub use response::*;
pub use server::{HttpServer, HttpServerError};
