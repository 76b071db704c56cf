//! Find-or-create for domains, clients, upstreams and cache entries, plus
//! the hostname and group bookkeeping done on those records later.

use super::{ClientDelta, Datastore};
use crate::entities::{
    CacheEntry, CacheId, Client, ClientId, Domain, DomainId, HwAddr, Upstream, UpstreamId,
};
use crate::error::StoreResult;
use crate::events::StoreEvent;
use crate::strings::hash_str;
use crate::types::{CacheDecision, QueryType};
use log::{debug, warn};

impl Datastore {
    // ============================================================================================
    // DOMAINS
    // ============================================================================================

    /// Find the domain named `name`, creating it if needed.
    ///
    /// With `count` set, an existing domain has its query count bumped and
    /// its last-query time refreshed; a new one starts with a count of one.
    pub fn find_domain(&mut self, name: &str, count: bool) -> StoreResult<DomainId> {
        let (id, created) = self.find_or_create_domain(name)?;
        if count {
            self.count_domain(id, created);
        }
        Ok(id)
    }

    /// Find-or-create without counting. Also reports whether the domain is new.
    pub(crate) fn find_or_create_domain(&mut self, name: &str) -> StoreResult<(DomainId, bool)> {
        let hash = hash_str(name);
        let strings = &self.strings;
        if let Some(id) = self
            .domains
            .find(|d| d.hash == hash && strings.resolve(d.name) == name)
        {
            return Ok((id, false));
        }

        let pos = self.strings.intern(name)?;
        let id = self.domains.insert(Domain {
            name: pos,
            hash,
            count: 0,
            blocked: 0,
            last_query_ms: 0,
        })?;
        debug!("New domain {} -> ID {}", name, id);
        Ok((id, true))
    }

    /// Count one query for `domain`. The last-query time is left unset on
    /// the query that created the domain.
    pub(crate) fn count_domain(&mut self, domain: DomainId, created: bool) {
        let now = self.clock.now_ms();
        if let Some(d) = self.domains.get_mut(domain) {
            d.count += 1;
            if !created {
                d.last_query_ms = now;
            }
        }
    }

    // ============================================================================================
    // CLIENTS
    // ============================================================================================

    /// Find the client with address `ip`.
    ///
    /// Returns `Ok(None)` for an unknown address when neither `count` nor
    /// `alias` is set. Otherwise a missing client is created; alias-clients
    /// are created with zero counts. Counting an existing (non-alias) client
    /// goes through `change_client_count`, so its alias-client sees the
    /// query too.
    pub fn find_client(
        &mut self,
        ip: &str,
        count: bool,
        alias: bool,
    ) -> StoreResult<Option<ClientId>> {
        if let Some(id) = self.lookup_client(ip) {
            if count && !alias {
                self.change_client_count(id, ClientDelta::total(1));
            }
            return Ok(Some(id));
        }
        if !count && !alias {
            return Ok(None);
        }
        self.create_client(ip, count && !alias, alias).map(Some)
    }

    /// Find-or-create a regular client without counting. Also reports
    /// whether the client is new.
    pub(crate) fn find_or_create_client(&mut self, ip: &str) -> StoreResult<(ClientId, bool)> {
        match self.lookup_client(ip) {
            Some(id) => Ok((id, false)),
            None => self.create_client(ip, false, false).map(|id| (id, true)),
        }
    }

    fn lookup_client(&self, ip: &str) -> Option<ClientId> {
        let first = ip.as_bytes().first();
        let strings = &self.strings;
        self.clients.find(|c| {
            let stored = strings.resolve(c.ip);
            stored.as_bytes().first() == first && stored == ip
        })
    }

    fn create_client(&mut self, ip: &str, count: bool, alias: bool) -> StoreResult<ClientId> {
        let now = self.clock.now_ms();
        let pos = self.strings.intern(ip)?;
        let mut client = Client::new(pos, alias, self.aggregator.overtime().len(), now);
        client.count = i64::from(count);
        client.arp_count = client.count;
        let id = self.clients.insert(client)?;
        debug!(
            "New {} {} -> ID {}",
            if alias { "alias-client" } else { "client" },
            ip,
            id
        );

        self.events.raise(StoreEvent::ResolveNewHostnames);
        if !alias {
            if !self.startup {
                self.events.raise(StoreEvent::ReloadClientRegex(id));
            }
            if let Err(e) = self.reset_alias_client(id) {
                warn!("Client {} left without its alias-client: {}", ip, e);
            }
        }
        Ok(id)
    }

    /// Clients whose hostname has not been looked up yet.
    pub fn clients_needing_resolution(&self) -> Vec<ClientId> {
        self.clients
            .iter()
            .filter(|(_, c)| c.is_new)
            .map(|(id, _)| id)
            .collect()
    }

    /// Store the resolved hostname (possibly empty) and clear `is_new`.
    pub fn set_client_hostname(&mut self, client: ClientId, name: &str) -> StoreResult<bool> {
        if !self.clients.contains(client) {
            return Ok(false);
        }
        let pos = self.strings.intern(name)?;
        if let Some(c) = self.clients.get_mut(client) {
            c.name = pos;
            c.is_new = false;
        }
        Ok(true)
    }

    /// Record the neighbour-cache view of a client. The alias-client
    /// association is re-evaluated since it may key on the hardware address.
    pub fn set_client_hwaddr(
        &mut self,
        client: ClientId,
        hwaddr: HwAddr,
        iface: &str,
    ) -> StoreResult<bool> {
        if !self.clients.contains(client) {
            return Ok(false);
        }
        let iface = self.strings.intern(iface)?;
        let is_alias = match self.clients.get_mut(client) {
            Some(c) => {
                c.hwaddr = Some(hwaddr);
                c.iface = iface;
                c.arp_count = 0;
                c.is_alias
            }
            None => return Ok(false),
        };
        if !is_alias {
            self.reset_alias_client(client)?;
        }
        Ok(true)
    }

    /// Store the group ids resolved for a client.
    pub fn set_client_groups(&mut self, client: ClientId, groups: &str) -> StoreResult<bool> {
        if !self.clients.contains(client) {
            return Ok(false);
        }
        let pos = self.strings.intern(groups)?;
        if let Some(c) = self.clients.get_mut(client) {
            c.groups = pos;
            c.found_group = true;
            c.reread_groups += 1;
        }
        Ok(true)
    }

    // ============================================================================================
    // UPSTREAMS
    // ============================================================================================

    /// Find the upstream at `addr`#`port`, creating it if needed.
    pub fn find_upstream(&mut self, addr: &str, port: u16) -> StoreResult<UpstreamId> {
        let strings = &self.strings;
        if let Some(id) = self
            .upstreams
            .find(|u| u.port == port && strings.resolve(u.addr) == addr)
        {
            return Ok(id);
        }

        let pos = self.strings.intern(addr)?;
        let id = self.upstreams.insert(Upstream::new(pos, port))?;
        debug!("New upstream {}#{} -> ID {}", addr, port, id);
        self.events.raise(StoreEvent::ResolveNewHostnames);
        Ok(id)
    }

    pub fn upstreams_needing_resolution(&self) -> Vec<UpstreamId> {
        self.upstreams
            .iter()
            .filter(|(_, u)| u.is_new)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn set_upstream_hostname(&mut self, upstream: UpstreamId, name: &str) -> StoreResult<bool> {
        if !self.upstreams.contains(upstream) {
            return Ok(false);
        }
        let pos = self.strings.intern(name)?;
        if let Some(u) = self.upstreams.get_mut(upstream) {
            u.name = pos;
            u.is_new = false;
        }
        Ok(true)
    }

    pub fn record_upstream_response(&mut self, upstream: UpstreamId, rtt_ms: f64) -> bool {
        let now = self.clock.now_ms();
        match self.upstreams.get_mut(upstream) {
            Some(u) => {
                u.record_response(rtt_ms, now);
                true
            }
            None => false,
        }
    }

    pub fn record_upstream_failure(&mut self, upstream: UpstreamId) -> bool {
        match self.upstreams.get_mut(upstream) {
            Some(u) => {
                u.failed += 1;
                true
            }
            None => false,
        }
    }

    // ============================================================================================
    // DECISION CACHE
    // ============================================================================================

    /// Find the cache entry for (`domain`, `client`, `query_type`). A missing
    /// entry is created only when `create` is set.
    pub fn find_cache(
        &mut self,
        domain: DomainId,
        client: ClientId,
        query_type: QueryType,
        create: bool,
    ) -> StoreResult<Option<CacheId>> {
        let found = self.cache.find(|c| {
            c.domain == domain && c.client == client && c.query_type == query_type
        });
        if found.is_some() || !create {
            return Ok(found);
        }
        let id = self
            .cache
            .insert(CacheEntry::new(domain, client, query_type))?;
        Ok(Some(id))
    }

    /// Memoise the list lookup outcome for a cache entry.
    pub fn set_cache_decision(
        &mut self,
        cache: CacheId,
        decision: CacheDecision,
        list_id: Option<i64>,
    ) -> bool {
        match self.cache.get_mut(cache) {
            Some(entry) => {
                entry.decision = decision;
                entry.list_id = list_id;
                true
            }
            None => false,
        }
    }
}
