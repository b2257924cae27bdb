use crate::PortId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PortProtocol {
    Tcp,
    Udp,
    Sctp,
}

impl fmt::Display for PortProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortProtocol::Tcp => f.write_str("tcp"),
            PortProtocol::Udp => f.write_str("udp"),
            PortProtocol::Sctp => f.write_str("sctp"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PortSpec {
    pub number: u16,
    pub protocol: PortProtocol,
}

impl PortSpec {
    pub fn new(number: u16, protocol: PortProtocol) -> Self {
        Self { number, protocol }
    }

    /// Docker-style `<number>/<protocol>` notation.
    pub fn to_docker_notation(&self) -> String {
        format!("{}/{}", self.number, self.protocol)
    }
}

/// Declarative description of the container backing one service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerSpec {
    pub image: String,
    pub used_ports: BTreeMap<PortId, PortSpec>,
}

impl ContainerSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            used_ports: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_port(mut self, id: impl Into<PortId>, port: PortSpec) -> Self {
        self.used_ports.insert(id.into(), port);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_docker_notation() {
        let port = PortSpec::new(1323, PortProtocol::Tcp);
        assert_eq!(port.to_docker_notation(), "1323/tcp");
        assert_eq!(
            PortSpec::new(53, PortProtocol::Udp).to_docker_notation(),
            "53/udp"
        );
    }

    #[test]
    fn builder_collects_named_ports() {
        let spec = ContainerSpec::new("example/image")
            .with_port("grpc", PortSpec::new(1323, PortProtocol::Tcp))
            .with_port("metrics", PortSpec::new(9090, PortProtocol::Tcp));
        assert_eq!(spec.image, "example/image");
        assert_eq!(spec.used_ports.len(), 2);
        assert_eq!(spec.used_ports[&PortId::new("grpc")].number, 1323);
    }

    #[test]
    fn protocol_serializes_lowercase() {
        let json = serde_json::to_string(&PortProtocol::Sctp).unwrap();
        assert_eq!(json, "\"sctp\"");
    }
}
