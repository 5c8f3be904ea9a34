//! Boundary-facing result mappings
//!
//! These functions run the whole pipeline on raw strings (screening, parsing,
//! resolution, subnet math, summarization) and never fail: every error is
//! folded into a `{"error": "..."}` mapping. A success mapping always carries
//! the full set of fields.

use crate::pattern::{cidr_list, ipv4_regex};
use crate::summarize::{summarize_addresses, summarize_network};
use crate::{derive, Address, CalcError, HostCount, IpVersion, Network, Result};
use serde::Serialize;
use subcalc_core::validate::{sanitize_field, SEPARATOR};
use subcalc_core::AddressKind;
use tracing::{debug, warn};

/// Success or error mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report<T> {
    Success(T),
    Failure { error: String },
}

impl<T> Report<T> {
    pub fn is_error(&self) -> bool {
        matches!(self, Report::Failure { .. })
    }

    /// Error message, if this is a failure
    pub fn error(&self) -> Option<&str> {
        match self {
            Report::Success(_) => None,
            Report::Failure { error } => Some(error),
        }
    }

    pub fn into_result(self) -> std::result::Result<T, String> {
        match self {
            Report::Success(value) => Ok(value),
            Report::Failure { error } => Err(error),
        }
    }
}

impl<T> From<Result<T>> for Report<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Report::Success(value),
            Err(err) => {
                warn!(error = %err, "calculation rejected");
                Report::Failure {
                    error: err.to_string(),
                }
            }
        }
    }
}

/// Network calculation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkReport {
    #[serde(rename = "Network Address")]
    pub network_address: Address,
    #[serde(rename = "Broadcast Address")]
    pub broadcast_address: Address,
    #[serde(rename = "CIDR")]
    pub cidr: u8,
    #[serde(rename = "Netmask")]
    pub netmask: Address,
    /// IPv4 only
    #[serde(rename = "Wildcard", skip_serializing_if = "Option::is_none")]
    pub wildcard: Option<Address>,
    #[serde(rename = "HostMin")]
    pub host_min: Address,
    #[serde(rename = "HostMax")]
    pub host_max: Address,
    #[serde(rename = "Total Hosts")]
    pub total_hosts: HostCount,
    /// Summarized CIDR blocks, when a pattern was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Vec<String>>,
    /// Dotted-quad regex, when a pattern was requested for IPv4
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

/// Address-only query result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressReport {
    #[serde(rename = "Address")]
    pub address: Address,
    #[serde(rename = "Version")]
    pub version: u8,
    #[serde(rename = "Is Private")]
    pub is_private: bool,
    #[serde(rename = "Is Global")]
    pub is_global: bool,
    #[serde(rename = "Type")]
    pub kind: AddressKind,
    #[serde(rename = "Is Loopback")]
    pub is_loopback: bool,
    #[serde(rename = "Is Multicast")]
    pub is_multicast: bool,
    #[serde(rename = "Is Link Local")]
    pub is_link_local: bool,
    #[serde(rename = "Binary")]
    pub binary: String,
    #[serde(rename = "Hexadecimal")]
    pub hexadecimal: String,
    #[serde(rename = "Reverse Pointer")]
    pub reverse_pointer: String,
}

/// Range summary result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryReport {
    #[serde(rename = "First")]
    pub first: Address,
    #[serde(rename = "Last")]
    pub last: Address,
    #[serde(rename = "Blocks")]
    pub blocks: Vec<String>,
    #[serde(rename = "Regex", skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

/// Calculate network details from raw form input
///
/// `ip_address` may carry `address/spec` when `network_spec` is blank.
///
/// # Examples
///
/// ```
/// use subcalc_cidr::report::calculate;
///
/// let report = calculate("10.0.0.5", "32", false);
/// let json = serde_json::to_value(&report).unwrap();
/// assert_eq!(json["Total Hosts"], 1);
/// assert_eq!(json["Wildcard"], "0.0.0.0");
///
/// let report = calculate("192.168.1.1!", "24", false);
/// assert!(report.error().unwrap().contains("invalid characters"));
/// ```
pub fn calculate(ip_address: &str, network_spec: &str, with_pattern: bool) -> Report<NetworkReport> {
    try_calculate(ip_address, network_spec, with_pattern).into()
}

fn try_calculate(ip_address: &str, network_spec: &str, with_pattern: bool) -> Result<NetworkReport> {
    let network = if network_spec.trim().is_empty() {
        let combined = sanitize_field("IP address", ip_address, true)?;
        if !combined.contains(SEPARATOR) {
            return Err(CalcError::EmptyInput("Network".to_string()));
        }
        Network::parse(&combined)?
    } else {
        let address = sanitize_field("IP address", ip_address, false)?;
        let spec = sanitize_field("Network", network_spec, false)?;
        Network::resolve(&address, &spec)?
    };

    Ok(network_report(&network, with_pattern))
}

/// Build the success mapping for an already resolved network
pub fn network_report(network: &Network, with_pattern: bool) -> NetworkReport {
    let details = derive(network);

    let (pattern, regex) = if with_pattern {
        let blocks = summarize_network(network);
        (Some(cidr_list(&blocks)), ipv4_regex(&blocks))
    } else {
        (None, None)
    };

    debug!(%network, with_pattern, "calculated network");

    NetworkReport {
        network_address: network.network(),
        broadcast_address: details.broadcast,
        cidr: network.prefix_len(),
        netmask: details.netmask,
        wildcard: match network.version() {
            IpVersion::V4 => Some(details.wildcard),
            IpVersion::V6 => None,
        },
        host_min: details.host_min,
        host_max: details.host_max,
        total_hosts: details.total_hosts,
        pattern,
        regex,
    }
}

/// Describe a single address
///
/// ```
/// use subcalc_cidr::report::describe_address;
///
/// let json = serde_json::to_value(describe_address("10.1.2.3")).unwrap();
/// assert_eq!(json["Type"], "Private");
/// assert_eq!(json["Version"], 4);
/// ```
pub fn describe_address(text: &str) -> Report<AddressReport> {
    try_describe(text).into()
}

fn try_describe(text: &str) -> Result<AddressReport> {
    let address = Address::parse(&sanitize_field("IP address", text, false)?)?;

    Ok(AddressReport {
        address,
        version: address.version().number(),
        is_private: address.is_private(),
        is_global: address.is_global(),
        kind: address.kind(),
        is_loopback: address.is_loopback(),
        is_multicast: address.is_multicast(),
        is_link_local: address.is_link_local(),
        binary: address.to_binary(),
        hexadecimal: address.to_hex(),
        reverse_pointer: address.reverse_pointer(),
    })
}

/// Summarize the inclusive range between two textual addresses
pub fn summarize_range(first: &str, last: &str) -> Report<SummaryReport> {
    try_summarize(first, last).into()
}

fn try_summarize(first: &str, last: &str) -> Result<SummaryReport> {
    let first = Address::parse(&sanitize_field("First address", first, false)?)?;
    let last = Address::parse(&sanitize_field("Last address", last, false)?)?;
    let blocks = summarize_addresses(&first, &last)?;

    Ok(SummaryReport {
        first,
        last,
        blocks: cidr_list(&blocks),
        regex: ipv4_regex(&blocks),
    })
}
