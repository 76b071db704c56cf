//! Alias-client propagation.
//!
//! A client may be managed by an alias-client, which presents several
//! addresses (say a laptop's IPv4 and IPv6 addresses) as one client. Every
//! count applied to a managed client is mirrored onto its alias-client, so
//! an alias-client's totals always equal the sum over the clients it
//! manages. Alias-clients never receive counts directly.

use super::Datastore;
use crate::entities::{Client, ClientId, HwAddr};
use crate::error::StoreResult;
use log::{debug, warn};
use std::collections::HashMap;

/// Count changes for one client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientDelta {
    pub total: i64,
    pub blocked: i64,
    /// OverTime bucket index and the change to its count
    pub overtime: Option<(usize, i64)>,
}

impl ClientDelta {
    pub fn total(n: i64) -> Self {
        Self {
            total: n,
            ..Self::default()
        }
    }

    pub fn blocked(n: i64) -> Self {
        Self {
            blocked: n,
            ..Self::default()
        }
    }

    pub fn overtime(bucket: usize, n: i64) -> Self {
        Self {
            overtime: Some((bucket, n)),
            ..Self::default()
        }
    }

    fn apply(&self, client: &mut Client) {
        client.count += self.total;
        client.blocked += self.blocked;
        if let Some((bucket, n)) = self.overtime {
            if let Some(slot) = client.overtime.get_mut(bucket) {
                *slot += n;
            }
        }
    }
}

/// Decides which alias-client, if any, manages a client.
pub trait AliasDirectory: Send + Sync {
    /// Lookup key (used as the alias-client's address) for the alias-client
    /// managing the client at `ip`.
    fn alias_for(&self, ip: &str, hwaddr: Option<&HwAddr>) -> Option<String>;
}

/// In-memory directory keyed by address and by hardware address.
#[derive(Debug, Default, Clone)]
pub struct AliasMap {
    by_ip: HashMap<String, String>,
    by_hwaddr: HashMap<HwAddr, String>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_ip(&mut self, ip: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.by_ip.insert(ip.into(), alias.into());
        self
    }

    pub fn add_hwaddr(&mut self, hwaddr: HwAddr, alias: impl Into<String>) -> &mut Self {
        self.by_hwaddr.insert(hwaddr, alias.into());
        self
    }
}

impl AliasDirectory for AliasMap {
    fn alias_for(&self, ip: &str, hwaddr: Option<&HwAddr>) -> Option<String> {
        hwaddr
            .and_then(|mac| self.by_hwaddr.get(mac))
            .or_else(|| self.by_ip.get(ip))
            .cloned()
    }
}

/// Everything a client contributes to its alias-client.
struct Contribution {
    count: i64,
    blocked: i64,
    overtime: Vec<i64>,
}

impl Contribution {
    fn of(client: &Client) -> Self {
        Self {
            count: client.count,
            blocked: client.blocked,
            overtime: client.overtime.clone(),
        }
    }

    fn apply(&self, alias: &mut Client, sign: i64) {
        alias.count += sign * self.count;
        alias.blocked += sign * self.blocked;
        for (slot, n) in alias.overtime.iter_mut().zip(&self.overtime) {
            *slot += sign * n;
        }
    }
}

impl Datastore {
    /// Apply `delta` to `client` and, if it is managed, to its alias-client.
    ///
    /// Deltas aimed at an alias-client are refused before anything changes.
    /// Returns whether the delta was applied.
    pub fn change_client_count(&mut self, client: ClientId, delta: ClientDelta) -> bool {
        let alias = match self.clients.get_mut(client) {
            Some(c) if c.is_alias => {
                warn!(
                    "Refusing to change counts of alias-client {} directly",
                    self.strings.resolve(c.ip)
                );
                return false;
            }
            Some(c) => {
                delta.apply(c);
                c.alias
            }
            None => return false,
        };

        if let Some(alias) = alias {
            match self.clients.get_mut(alias) {
                Some(a) => delta.apply(a),
                None => debug!("Alias-client {} of client {} is gone", alias, client),
            }
        }
        true
    }

    /// Put `client` under `alias`, moving its accumulated counts over.
    /// A previous association is dissolved first.
    pub fn link_alias_client(&mut self, client: ClientId, alias: ClientId) -> bool {
        let current = match (self.clients.get(client), self.clients.get(alias)) {
            (Some(c), Some(a)) if !c.is_alias && a.is_alias => c.alias,
            _ => return false,
        };
        if current == Some(alias) {
            return true;
        }
        if current.is_some() {
            self.unlink_alias_client(client);
        }

        let Some(contribution) = self.clients.get(client).map(Contribution::of) else {
            return false;
        };
        if let Some(a) = self.clients.get_mut(alias) {
            contribution.apply(a, 1);
        }
        if let Some(c) = self.clients.get_mut(client) {
            c.alias = Some(alias);
        }
        debug!("Client {} now managed by alias-client {}", client, alias);
        true
    }

    /// Release `client` from its alias-client, taking its counts back out.
    pub fn unlink_alias_client(&mut self, client: ClientId) -> bool {
        let Some((alias, contribution)) = self
            .clients
            .get(client)
            .and_then(|c| c.alias.map(|a| (a, Contribution::of(c))))
        else {
            return false;
        };
        if let Some(a) = self.clients.get_mut(alias) {
            contribution.apply(a, -1);
        }
        if let Some(c) = self.clients.get_mut(client) {
            c.alias = None;
        }
        debug!("Client {} released from alias-client {}", client, alias);
        true
    }

    /// Ask the alias directory which alias-client manages `client` and
    /// update the association to match. No-op without a directory.
    pub fn reset_alias_client(&mut self, client: ClientId) -> StoreResult<()> {
        let Some(directory) = self.aliases.clone() else {
            return Ok(());
        };
        let Some(c) = self.clients.get(client) else {
            return Ok(());
        };
        if c.is_alias {
            return Ok(());
        }
        let key = directory.alias_for(self.strings.resolve(c.ip), c.hwaddr.as_ref());

        match key {
            Some(key) => {
                if let Some(alias) = self.find_client(&key, false, true)? {
                    if !self.link_alias_client(client, alias) {
                        warn!(
                            "Alias key {} names a regular client, leaving client {} unmanaged",
                            key, client
                        );
                    }
                }
            }
            None => {
                self.unlink_alias_client(client);
            }
        }
        Ok(())
    }
}
