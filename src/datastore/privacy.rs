//! Redacting accessors used by reporting code.
//!
//! The privacy level checked is the one stored on the query when it was
//! recorded. Lowering the configured level later does not reveal older
//! queries.

use super::Datastore;
use crate::entities::{Client, DomainId, QueryId};
use crate::strings::StrPos;
use crate::types::PrivacyLevel;

/// Shown instead of a domain name from `HideDomains` up.
pub const HIDDEN_DOMAIN: &str = "hidden";
/// Shown instead of a client address or name from `HideDomainsClients` up.
pub const HIDDEN_CLIENT: &str = "0.0.0.0";

impl Datastore {
    /// Name of the queried domain.
    pub fn domain_string(&self, query: QueryId) -> &str {
        match self.queries.get(query) {
            Some(q) => self.redacted_domain(q.privacy, Some(q.domain)),
            None => "",
        }
    }

    /// Name of the CNAME target the query was blocked on, empty if none.
    pub fn cname_domain_string(&self, query: QueryId) -> &str {
        match self.queries.get(query) {
            Some(q) => self.redacted_domain(q.privacy, q.cname_domain),
            None => "",
        }
    }

    pub fn client_ip_string(&self, query: QueryId) -> &str {
        self.redacted_client(query, |c| c.ip)
    }

    /// Resolved hostname of the client, empty if not resolved.
    pub fn client_name_string(&self, query: QueryId) -> &str {
        self.redacted_client(query, |c| c.name)
    }

    fn redacted_domain(&self, privacy: PrivacyLevel, domain: Option<DomainId>) -> &str {
        let Some(domain) = domain else {
            return "";
        };
        if privacy >= PrivacyLevel::HideDomains {
            return HIDDEN_DOMAIN;
        }
        self.domain_name(domain).unwrap_or("")
    }

    fn redacted_client<F>(&self, query: QueryId, field: F) -> &str
    where
        F: Fn(&Client) -> StrPos,
    {
        let Some(q) = self.queries.get(query) else {
            return "";
        };
        if q.privacy >= PrivacyLevel::HideDomainsClients {
            return HIDDEN_CLIENT;
        }
        self.clients
            .get(q.client)
            .map_or("", |c| self.strings.resolve(field(c)))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::entities::NewQuery;

    #[test]
    fn test_show_all_resolves_everything() {
        let (mut store, _) = store();
        let q = store.add_query(NewQuery::new(1, "example.com", "10.0.0.1", 1)).unwrap();
        let client = store.queries().get(q).unwrap().client;
        store.set_client_hostname(client, "laptop.lan").unwrap();

        assert_eq!(store.domain_string(q), "example.com");
        assert_eq!(store.cname_domain_string(q), "");
        assert_eq!(store.client_ip_string(q), "10.0.0.1");
        assert_eq!(store.client_name_string(q), "laptop.lan");
    }

    #[test]
    fn test_recorded_level_wins_over_current() {
        let (mut store, _) = store();
        store.set_privacy_level(PrivacyLevel::HideDomains);
        let hidden = store.add_query(NewQuery::new(1, "secret.example", "10.0.0.1", 1)).unwrap();
        store.set_query_cname(hidden, "cdn.example").unwrap();
        store.set_privacy_level(PrivacyLevel::ShowAll);
        let shown = store.add_query(NewQuery::new(2, "secret.example", "10.0.0.1", 1)).unwrap();

        assert_eq!(store.domain_string(hidden), HIDDEN_DOMAIN);
        assert_eq!(store.cname_domain_string(hidden), HIDDEN_DOMAIN);
        assert_eq!(store.client_ip_string(hidden), "10.0.0.1");
        assert_eq!(store.domain_string(shown), "secret.example");
    }

    #[test]
    fn test_client_hidden_from_level_two() {
        let (mut store, _) = store();
        store.set_privacy_level(PrivacyLevel::HideDomainsClients);
        let q = store.add_query(NewQuery::new(1, "example.com", "10.0.0.1", 1)).unwrap();
        assert_eq!(store.domain_string(q), HIDDEN_DOMAIN);
        assert_eq!(store.client_ip_string(q), HIDDEN_CLIENT);
        assert_eq!(store.client_name_string(q), HIDDEN_CLIENT);
    }

    #[test]
    fn test_missing_records_yield_empty() {
        let (mut store, _) = store();
        let q = store.add_query(NewQuery::new(1, "example.com", "10.0.0.1", 1)).unwrap();
        let domain = store.queries().get(q).unwrap().domain;
        store.retire_domain(domain);
        assert_eq!(store.domain_string(q), "");

        store.retire_query(q);
        assert_eq!(store.domain_string(q), "");
        assert_eq!(store.client_ip_string(q), "");
    }
}
