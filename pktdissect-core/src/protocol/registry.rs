//! Dissector trait, dispatch keys and the registry that maps one to the other.

use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use super::{
    ArpDissector, DhcpDissector, DissectContext, Decoded, EthernetDissector, GreDissector,
    IcmpDissector, Ipv4Dissector, Ipv6Dissector, Layer, LinuxSllDissector, LldpDissector,
    RawIpDissector, TcpDissector, UdpDissector, VlanDissector,
};
use crate::cursor::Cursor;
use crate::error::DissectError;

/// Transport protocols whose ports select an application dissector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Tcp,
    Udp,
}

/// Namespaced identifier a parent layer uses to name its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DispatchKey {
    /// Link-layer type of the capture.
    Link(u16),
    EtherType(u16),
    IpProtocol(u8),
    UdpPort(u16),
    TcpPort(u16),
}

impl DispatchKey {
    pub fn port(transport: Transport, port: u16) -> Self {
        match transport {
            Transport::Tcp => DispatchKey::TcpPort(port),
            Transport::Udp => DispatchKey::UdpPort(port),
        }
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            DispatchKey::Link(_) => "link type",
            DispatchKey::EtherType(_) => "ethertype",
            DispatchKey::IpProtocol(_) => "ip protocol",
            DispatchKey::UdpPort(_) => "udp port",
            DispatchKey::TcpPort(_) => "tcp port",
        }
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchKey::EtherType(v) => write!(f, "{} {v:#06x}", self.namespace()),
            DispatchKey::Link(v) | DispatchKey::UdpPort(v) | DispatchKey::TcpPort(v) => {
                write!(f, "{} {v}", self.namespace())
            }
            DispatchKey::IpProtocol(v) => write!(f, "{} {v}", self.namespace()),
        }
    }
}

/// Core trait all protocol dissectors implement.
pub trait Dissector: Send + Sync {
    /// Unique identifier for this protocol (e.g., "tcp", "dhcp").
    fn name(&self) -> &'static str;

    /// Human-readable display name.
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Keys under which the registry files this dissector.
    fn keys(&self) -> &'static [DispatchKey];

    /// Bytes that must be captured before any field is read.
    fn min_header_len(&self) -> usize;

    /// Decode one header from `cursor` (positioned at the header start).
    ///
    /// `claimed` is the length the enclosing layer assigns to this one; it
    /// may exceed `cursor.captured()` when the capture was cut short.
    /// Fields go into `layer` as they are read.
    fn dissect<'a>(
        &self,
        cursor: &Cursor<'a>,
        claimed: usize,
        ctx: &DissectContext<'_>,
        layer: &mut Layer<'a>,
    ) -> Result<Decoded, DissectError>;
}

/// Enum of all built-in dissectors.
///
/// This enables static dispatch (no vtable overhead) for all built-in protocols.
#[derive(Debug, Clone, Copy)]
pub enum BuiltinDissector {
    Ethernet(EthernetDissector),
    LinuxSll(LinuxSllDissector),
    RawIp(RawIpDissector),
    Vlan(VlanDissector),
    Arp(ArpDissector),
    Ipv4(Ipv4Dissector),
    Ipv6(Ipv6Dissector),
    Icmp(IcmpDissector),
    Udp(UdpDissector),
    Tcp(TcpDissector),
    Gre(GreDissector),
    Dhcp(DhcpDissector),
    Lldp(LldpDissector),
}

/// Macro to delegate Dissector trait methods to inner types.
macro_rules! delegate_dissector {
    ($self:expr, $method:ident $(, $arg:expr)*) => {
        match $self {
            BuiltinDissector::Ethernet(d) => d.$method($($arg),*),
            BuiltinDissector::LinuxSll(d) => d.$method($($arg),*),
            BuiltinDissector::RawIp(d) => d.$method($($arg),*),
            BuiltinDissector::Vlan(d) => d.$method($($arg),*),
            BuiltinDissector::Arp(d) => d.$method($($arg),*),
            BuiltinDissector::Ipv4(d) => d.$method($($arg),*),
            BuiltinDissector::Ipv6(d) => d.$method($($arg),*),
            BuiltinDissector::Icmp(d) => d.$method($($arg),*),
            BuiltinDissector::Udp(d) => d.$method($($arg),*),
            BuiltinDissector::Tcp(d) => d.$method($($arg),*),
            BuiltinDissector::Gre(d) => d.$method($($arg),*),
            BuiltinDissector::Dhcp(d) => d.$method($($arg),*),
            BuiltinDissector::Lldp(d) => d.$method($($arg),*),
        }
    };
}

impl Dissector for BuiltinDissector {
    #[inline]
    fn name(&self) -> &'static str {
        delegate_dissector!(self, name)
    }

    #[inline]
    fn display_name(&self) -> &'static str {
        delegate_dissector!(self, display_name)
    }

    #[inline]
    fn keys(&self) -> &'static [DispatchKey] {
        delegate_dissector!(self, keys)
    }

    #[inline]
    fn min_header_len(&self) -> usize {
        delegate_dissector!(self, min_header_len)
    }

    #[inline]
    fn dissect<'a>(
        &self,
        cursor: &Cursor<'a>,
        claimed: usize,
        ctx: &DissectContext<'_>,
        layer: &mut Layer<'a>,
    ) -> Result<Decoded, DissectError> {
        delegate_dissector!(self, dissect, cursor, claimed, ctx, layer)
    }
}

/// Conversion traits for ergonomic registration.
impl From<EthernetDissector> for BuiltinDissector {
    fn from(d: EthernetDissector) -> Self {
        BuiltinDissector::Ethernet(d)
    }
}

impl From<LinuxSllDissector> for BuiltinDissector {
    fn from(d: LinuxSllDissector) -> Self {
        BuiltinDissector::LinuxSll(d)
    }
}

impl From<RawIpDissector> for BuiltinDissector {
    fn from(d: RawIpDissector) -> Self {
        BuiltinDissector::RawIp(d)
    }
}

impl From<VlanDissector> for BuiltinDissector {
    fn from(d: VlanDissector) -> Self {
        BuiltinDissector::Vlan(d)
    }
}

impl From<ArpDissector> for BuiltinDissector {
    fn from(d: ArpDissector) -> Self {
        BuiltinDissector::Arp(d)
    }
}

impl From<Ipv4Dissector> for BuiltinDissector {
    fn from(d: Ipv4Dissector) -> Self {
        BuiltinDissector::Ipv4(d)
    }
}

impl From<Ipv6Dissector> for BuiltinDissector {
    fn from(d: Ipv6Dissector) -> Self {
        BuiltinDissector::Ipv6(d)
    }
}

impl From<IcmpDissector> for BuiltinDissector {
    fn from(d: IcmpDissector) -> Self {
        BuiltinDissector::Icmp(d)
    }
}

impl From<UdpDissector> for BuiltinDissector {
    fn from(d: UdpDissector) -> Self {
        BuiltinDissector::Udp(d)
    }
}

impl From<TcpDissector> for BuiltinDissector {
    fn from(d: TcpDissector) -> Self {
        BuiltinDissector::Tcp(d)
    }
}

impl From<GreDissector> for BuiltinDissector {
    fn from(d: GreDissector) -> Self {
        BuiltinDissector::Gre(d)
    }
}

impl From<DhcpDissector> for BuiltinDissector {
    fn from(d: DhcpDissector) -> Self {
        BuiltinDissector::Dhcp(d)
    }
}

impl From<LldpDissector> for BuiltinDissector {
    fn from(d: LldpDissector) -> Self {
        BuiltinDissector::Lldp(d)
    }
}

/// Dispatch table from [`DispatchKey`] to dissector.
///
/// Populated once, then only read; lookups are a single hash probe.
#[derive(Debug, Clone, Default)]
pub struct DissectorRegistry {
    table: HashMap<DispatchKey, BuiltinDissector>,
    dissectors: Vec<BuiltinDissector>,
}

impl DissectorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dissector under every key it declares.
    ///
    /// A key already taken is re-pointed at the new dissector.
    pub fn register<D: Into<BuiltinDissector>>(&mut self, dissector: D) {
        let dissector = dissector.into();
        for key in dissector.keys() {
            if let Some(previous) = self.table.insert(*key, dissector) {
                warn!(
                    %key,
                    previous = previous.name(),
                    replacement = dissector.name(),
                    "dispatch key registered twice"
                );
            }
        }
        self.dissectors.push(dissector);
    }

    #[inline]
    pub fn lookup(&self, key: DispatchKey) -> Option<&BuiltinDissector> {
        self.table.get(&key)
    }

    /// Get all registered dissectors, in registration order.
    pub fn all_dissectors(&self) -> impl Iterator<Item = &BuiltinDissector> {
        self.dissectors.iter()
    }

    /// Get a dissector by name.
    pub fn get(&self, name: &str) -> Option<&BuiltinDissector> {
        self.dissectors.iter().find(|d| d.name() == name)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<DispatchKey> {
        let mut keys: Vec<_> = self.table.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Get the number of registered dissectors.
    pub fn len(&self) -> usize {
        self.dissectors.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.dissectors.is_empty()
    }
}
