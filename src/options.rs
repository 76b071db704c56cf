//! Resolver option values and their canonical spellings.
//!
//! Parsing is case-insensitive and yields `None` for anything unknown, so
//! callers can fall back to a default instead of failing.

macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal $(| $alias:literal)*),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                $(
                    if s.eq_ignore_ascii_case($text) $(|| s.eq_ignore_ascii_case($alias))* {
                        return Some($name::$variant);
                    }
                )+
                None
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

option_enum! {
    /// Which clients get their hostnames refreshed.
    RefreshHostnames {
        All => "ALL",
        Ipv4Only => "IPV4_ONLY",
        Unknown => "UNKNOWN",
        None => "NONE",
    }
}

option_enum! {
    /// Reply sent for a blocked query.
    BlockingMode {
        Ip => "IP",
        Nx => "NX",
        Null => "NULL",
        IpNodataAaaa => "IP_NODATA_AAAA",
        Nodata => "NODATA",
    }
}

option_enum! {
    /// Answer for PTR queries of the resolver's own addresses.
    PtrType {
        PiHole => "PI.HOLE",
        Hostname => "HOSTNAME",
        HostnameFqdn => "HOSTNAMEFQDN",
        None => "NONE" | "false",
    }
}

option_enum! {
    /// Reply while the list database is locked.
    BusyReply {
        Block => "BLOCK",
        Allow => "ALLOW",
        Refuse => "REFUSE",
        Drop => "DROP",
    }
}

option_enum! {
    ListeningMode {
        Local => "LOCAL",
        All => "ALL",
        Single => "SINGLE",
        Bind => "BIND",
        None => "NONE",
    }
}

option_enum! {
    TempUnit {
        Celsius => "C",
        Fahrenheit => "F",
        Kelvin => "K",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_case() {
        assert_eq!(BlockingMode::parse("ip_nodata_aaaa"), Some(BlockingMode::IpNodataAaaa));
        assert_eq!(RefreshHostnames::parse("Ipv4_Only"), Some(RefreshHostnames::Ipv4Only));
        assert_eq!(TempUnit::parse("k"), Some(TempUnit::Kelvin));
    }

    #[test]
    fn test_invalid_value_is_none() {
        assert_eq!(BusyReply::parse("maybe"), None);
        assert_eq!(ListeningMode::parse(""), None);
    }

    #[test]
    fn test_ptr_false_alias() {
        assert_eq!(PtrType::parse("FALSE"), Some(PtrType::None));
        assert_eq!(PtrType::parse("pi.hole"), Some(PtrType::PiHole));
        assert_eq!(PtrType::None.as_str(), "NONE");
    }
}
