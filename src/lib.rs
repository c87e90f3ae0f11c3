// Rental marketplace host: catalog browsing (search, filters, likes) and the
// biometric quick-login gate, served over a small HTTP API.

use anyhow::{Context, Result};
use axum::extract::FromRef;
use std::sync::{Arc, Mutex};

pub mod biometric;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod gate;
pub mod likes;
pub mod lockout;
pub mod models;
pub mod price;
pub mod routes;
pub mod session;
pub mod store;

use crate::biometric::SimulatedDevice;
use crate::catalog::{CatalogSet, SEED_CATALOG};
use crate::config::Settings;
use crate::gate::{AuthGate, Liveness};
use crate::likes::LikeStore;
use crate::session::SessionContext;
use crate::store::{JsonFileStore, KeyValueStore, MemoryStore, Preferences};

// Shared application state handed to every handler
#[derive(Clone, FromRef)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub catalogs: Arc<CatalogSet>,
    pub likes: Arc<LikeStore>,
    pub session: Arc<SessionContext>,
    pub gate: Arc<AuthGate>,
    // Liveness of the login screen currently in focus
    pub login_screen: Arc<Mutex<Liveness>>,
}

impl AppState {
    // Wires the collaborators described by `settings`
    pub fn build(settings: Settings) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = match &settings.preferences_path {
            Some(path) => Arc::new(
                JsonFileStore::open(path)
                    .with_context(|| format!("Failed to open preference file {}", path))?,
            ),
            None => {
                tracing::info!("No preferences_path configured, preferences are kept in memory.");
                Arc::new(MemoryStore::new())
            }
        };

        let catalogs = match &settings.catalog_path {
            Some(path) => CatalogSet::from_file(path)?,
            None => SEED_CATALOG.clone(),
        };

        let device_settings = &settings.device;
        let device = Arc::new(
            SimulatedDevice::new(
                device_settings.biometric_kind,
                device_settings.hardware_present,
                device_settings.enrolled,
            )
            .with_default_outcome(device_settings.challenge_outcome.to_outcome()),
        );

        let gate = AuthGate::new(
            device.clone(),
            device,
            Preferences::new(store),
            settings.lockout.clone(),
        );

        Ok(AppState {
            settings: Arc::new(settings),
            catalogs: Arc::new(catalogs),
            likes: Arc::new(LikeStore::new()),
            session: Arc::new(SessionContext::new()),
            gate: Arc::new(gate),
            login_screen: Arc::new(Mutex::new(Liveness::new())),
        })
    }

    pub fn preferences(&self) -> &Preferences {
        self.gate.preferences()
    }

    // The login screen gained focus: results of challenges started from an
    // earlier focus must no longer be committed
    pub fn focus_login_screen(&self) -> Liveness {
        let fresh = Liveness::new();
        let mut current = self.login_screen.lock().unwrap_or_else(|p| p.into_inner());
        current.deactivate();
        *current = fresh.clone();
        fresh
    }

    pub fn blur_login_screen(&self) {
        self.login_screen
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .deactivate();
    }

    pub fn login_screen_liveness(&self) -> Liveness {
        self.login_screen
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}
