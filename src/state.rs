//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::{
    config::Config,
    db::DbPool,
    services::{mail::Mailer, translation_service::TranslationService},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
    pub mailer: Arc<dyn Mailer>,
    pub translator: Arc<TranslationService>,
}
