use futures_util::future::join_all;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::core::Credentials;
use crate::modules::marketplace::{Client, EntityId, MarketplaceRepository, Provider, Reference, Service};

/// Completes id-only or partial references for one report computation.
///
/// Every id is fetched at most once per reconciler; failed lookups are
/// remembered too and degrade to whatever the reference already carried.
/// Create one per computation and drop it when the report is built.
pub struct EntityReconciler<'a> {
    repository: &'a dyn MarketplaceRepository,
    credentials: &'a Credentials,
    services: HashMap<EntityId, Service>,
    providers: HashMap<EntityId, Provider>,
    clients: HashMap<EntityId, Client>,
    attempted_services: HashSet<EntityId>,
    attempted_providers: HashSet<EntityId>,
    attempted_clients: HashSet<EntityId>,
}

impl<'a> EntityReconciler<'a> {
    pub fn new(repository: &'a dyn MarketplaceRepository, credentials: &'a Credentials) -> Self {
        Self {
            repository,
            credentials,
            services: HashMap::new(),
            providers: HashMap::new(),
            clients: HashMap::new(),
            attempted_services: HashSet::new(),
            attempted_providers: HashSet::new(),
            attempted_clients: HashSet::new(),
        }
    }

    /// Record services already fetched as part of a listing
    pub fn seed_services(&mut self, services: impl IntoIterator<Item = Service>) {
        for service in services {
            self.remember_service(service);
        }
    }

    fn remember_service(&mut self, service: Service) {
        match self.services.get_mut(&service.id) {
            Some(known) => known.backfill_from(&service),
            None => {
                self.services.insert(service.id.clone(), service);
            }
        }
    }

    /// Complete every incomplete service among `refs` with one batch lookup.
    pub async fn resolve_services<'r>(&mut self, refs: impl IntoIterator<Item = &'r Reference<Service>>) {
        let mut pending: Vec<EntityId> = Vec::new();
        let mut queued: HashSet<EntityId> = HashSet::new();

        for reference in refs {
            if let Reference::Resolved(service) = reference {
                self.remember_service(service.as_ref().clone());
            }

            let id = reference.id();
            let complete = self.services.get(id).is_some_and(|s| !s.is_incomplete());
            if complete || self.attempted_services.contains(id) || !queued.insert(id.clone()) {
                continue;
            }
            pending.push(id.clone());
        }

        if pending.is_empty() {
            return;
        }

        debug!(resource = "servicio", count = pending.len(), "Reconciling service references");

        let found = match self.repository.get_services(self.credentials, &pending).await {
            Ok(found) => found,
            Err(e) => {
                warn!(resource = "servicio", error = %e, "Service reconciliation failed");
                HashMap::new()
            }
        };

        for id in pending {
            self.attempted_services.insert(id.clone());
            match found.get(&id) {
                Some(fetched) => {
                    let mut complete = fetched.clone();
                    if let Some(partial) = self.services.get(&id) {
                        complete.backfill_from(partial);
                    }
                    self.services.insert(id, complete);
                }
                None => {
                    warn!(resource = "servicio", id = %id, "Reference left unresolved");
                    self.services
                        .entry(id.clone())
                        .or_insert_with(|| Service::stub(id));
                }
            }
        }
    }

    /// Everything resolved or seeded so far
    pub fn services(&self) -> &HashMap<EntityId, Service> {
        &self.services
    }

    pub fn into_services(self) -> HashMap<EntityId, Service> {
        self.services
    }

    pub async fn resolve_provider(&mut self, reference: &Reference<Provider>) -> Provider {
        let id = reference.id().clone();
        if let Some(known) = self.providers.get(&id) {
            return known.clone();
        }

        let given = reference.entity().cloned();
        if let Some(provider) = given.as_ref().filter(|p| p.has_display_fields()) {
            self.providers.insert(id, provider.clone());
            return provider.clone();
        }

        self.resolve_providers(std::slice::from_ref(&id)).await;
        let resolved = self
            .providers
            .get(&id)
            .cloned()
            .filter(Provider::has_display_fields)
            .or(given)
            .unwrap_or_else(|| Provider::stub(id.clone()));
        self.providers.insert(id, resolved.clone());
        resolved
    }

    /// Fetch providers by id, concurrently, skipping ids already attempted
    pub async fn resolve_providers(&mut self, ids: &[EntityId]) -> Vec<Provider> {
        let pending: Vec<&EntityId> = ids
            .iter()
            .filter(|id| !self.attempted_providers.contains(*id) && !self.providers.contains_key(*id))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let repository = self.repository;
        let credentials = self.credentials;
        let results = join_all(pending.iter().map(|id| repository.get_provider(credentials, id))).await;

        for (id, result) in pending.into_iter().zip(results) {
            self.attempted_providers.insert(id.clone());
            match result {
                Ok(provider) => {
                    self.providers.insert(id.clone(), provider);
                }
                Err(e) => {
                    warn!(resource = "proveedor", id = %id, error = %e, "Reference left unresolved");
                    self.providers.insert(id.clone(), Provider::stub(id.clone()));
                }
            }
        }

        ids.iter().filter_map(|id| self.providers.get(id).cloned()).collect()
    }

    pub async fn resolve_client(&mut self, reference: &Reference<Client>) -> Client {
        let id = reference.id().clone();
        if let Some(known) = self.clients.get(&id) {
            return known.clone();
        }

        let given = reference.entity().cloned();
        if let Some(client) = given.as_ref().filter(|c| c.has_display_fields()) {
            self.clients.insert(id, client.clone());
            return client.clone();
        }

        self.resolve_clients(std::slice::from_ref(&id)).await;
        let resolved = self
            .clients
            .get(&id)
            .cloned()
            .filter(Client::has_display_fields)
            .or(given)
            .unwrap_or_else(|| Client::stub(id.clone()));
        self.clients.insert(id, resolved.clone());
        resolved
    }

    /// Fetch clients by id, concurrently, skipping ids already attempted
    pub async fn resolve_clients(&mut self, ids: &[EntityId]) -> Vec<Client> {
        let pending: Vec<&EntityId> = ids
            .iter()
            .filter(|id| !self.attempted_clients.contains(*id) && !self.clients.contains_key(*id))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let repository = self.repository;
        let credentials = self.credentials;
        let results = join_all(pending.iter().map(|id| repository.get_client(credentials, id))).await;

        for (id, result) in pending.into_iter().zip(results) {
            self.attempted_clients.insert(id.clone());
            match result {
                Ok(client) => {
                    self.clients.insert(id.clone(), client);
                }
                Err(e) => {
                    warn!(resource = "cliente", id = %id, error = %e, "Reference left unresolved");
                    self.clients.insert(id.clone(), Client::stub(id.clone()));
                }
            }
        }

        ids.iter().filter_map(|id| self.clients.get(id).cloned()).collect()
    }
}
