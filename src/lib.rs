pub mod classifier;
pub mod config;
pub mod error;
pub mod handlers;
pub mod labels;
pub mod logging;
pub mod models;
pub mod predict;
pub mod preprocess;
pub mod state;

use actix_web::web;

/// Register the HTTP routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/predict").route(web::post().to(handlers::predict)));
}
