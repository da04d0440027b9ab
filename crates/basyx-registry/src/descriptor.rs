//! Registry descriptor model.
//!
//! Only the parts of shell and submodel descriptors needed to locate a
//! registered entity are modelled; unknown fields are ignored on input.

use serde::{Deserialize, Serialize};

/// Protocol details of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolInformation {
    /// Address of the endpoint
    pub href: String,
    /// Declared protocol (e.g., "HTTP")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_protocol: Option<String>,
}

/// A registered endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Interface name (e.g., "AAS-3.0")
    pub interface: String,
    /// Where and how to reach it
    pub protocol_information: ProtocolInformation,
}

/// Registry entry of a submodel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmodelDescriptor {
    /// Submodel identifier
    pub id: String,
    /// Short identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_short: Option<String>,
    /// Endpoints in registration order
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

/// Registry entry of an Asset Administration Shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellDescriptor {
    /// Shell identifier
    pub id: String,
    /// Short identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_short: Option<String>,
    /// Endpoints in registration order
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    /// Submodels registered with this shell
    #[serde(default)]
    pub submodel_descriptors: Vec<SubmodelDescriptor>,
}

impl ShellDescriptor {
    /// Endpoint candidates in preference order.
    #[must_use]
    pub fn candidates(&self) -> Vec<EndpointCandidate> {
        self.endpoints.iter().map(EndpointCandidate::from).collect()
    }

    /// Submodel descriptor by submodel id.
    #[must_use]
    pub fn submodel(&self, submodel_id: &str) -> Option<&SubmodelDescriptor> {
        self.submodel_descriptors
            .iter()
            .find(|sm| sm.id == submodel_id)
    }
}

impl SubmodelDescriptor {
    /// Endpoint candidates in preference order.
    #[must_use]
    pub fn candidates(&self) -> Vec<EndpointCandidate> {
        self.endpoints.iter().map(EndpointCandidate::from).collect()
    }
}

/// One address at which a registered entity may be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCandidate {
    /// Protocol name as declared, or the address scheme
    pub protocol: String,
    /// Full address, including the entity's root path
    pub address: String,
}

impl EndpointCandidate {
    /// Candidate whose protocol is taken from the address scheme.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        let protocol = address
            .split_once("://")
            .map(|(scheme, _)| scheme.to_string())
            .unwrap_or_default();
        Self { protocol, address }
    }

    /// Candidate with an explicitly declared protocol.
    #[must_use]
    pub fn with_protocol(protocol: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            address: address.into(),
        }
    }

    /// Whether this candidate can be used for an HTTP redirect.
    #[must_use]
    pub fn is_http(&self) -> bool {
        self.protocol.eq_ignore_ascii_case("http") || self.protocol.eq_ignore_ascii_case("https")
    }
}

impl From<&Endpoint> for EndpointCandidate {
    fn from(endpoint: &Endpoint) -> Self {
        let info = &endpoint.protocol_information;
        match &info.endpoint_protocol {
            Some(protocol) => Self::with_protocol(protocol.clone(), info.href.clone()),
            None => Self::new(info.href.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor_json() -> serde_json::Value {
        serde_json::json!({
            "id": "urn:basyx:shell:pump-7",
            "idShort": "Pump7",
            "assetKind": "Instance",
            "endpoints": [
                {"interface": "AAS-3.0", "protocolInformation": {
                    "href": "http://10.0.0.7:8081/shells/cHVtcC03/aas",
                    "endpointProtocol": "HTTP",
                    "endpointProtocolVersion": ["1.1"]
                }},
                {"interface": "AAS-3.0", "protocolInformation": {
                    "href": "opc.tcp://10.0.0.7:4840"
                }}
            ],
            "submodelDescriptors": [
                {"id": "urn:basyx:sm:nameplate", "idShort": "Nameplate", "endpoints": [
                    {"interface": "SUBMODEL-3.0", "protocolInformation": {
                        "href": "https://10.0.0.8/submodels/bmFtZXBsYXRl/aas"
                    }}
                ]}
            ]
        })
    }

    #[test]
    fn parses_registry_json() {
        let descriptor: ShellDescriptor = serde_json::from_value(descriptor_json()).unwrap();
        assert_eq!(descriptor.id_short.as_deref(), Some("Pump7"));

        let candidates = descriptor.candidates();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].protocol, "HTTP");
        assert!(candidates[0].is_http());
        assert_eq!(candidates[1].protocol, "opc.tcp");
        assert!(!candidates[1].is_http());

        let sm = descriptor.submodel("urn:basyx:sm:nameplate").unwrap();
        let sm_candidates = sm.candidates();
        assert_eq!(sm_candidates[0].protocol, "https");
        assert!(descriptor.submodel("urn:missing").is_none());
    }

    #[test]
    fn minimal_descriptor() {
        let descriptor: ShellDescriptor =
            serde_json::from_value(serde_json::json!({"id": "urn:x"})).unwrap();
        assert!(descriptor.candidates().is_empty());
        assert!(descriptor.submodel_descriptors.is_empty());
    }

    #[test]
    fn candidate_without_scheme() {
        let candidate = EndpointCandidate::new("10.0.0.1/aas");
        assert_eq!(candidate.protocol, "");
        assert!(!candidate.is_http());
    }
}
