//! Parsing of service ingress status
//!
//! The template query prints the Go representation of
//! `.status.loadBalancer.ingress`, for example `[map[ip:203.0.113.7]]`. Until
//! the load balancer is provisioned kubectl prints `<no value>` (older
//! clients) or `<none>`, or nothing at all.

use serde_json::Value;

/// Go template passed to `kubectl get service --output template`
pub const INGRESS_TEMPLATE: &str = "{{.status.loadBalancer.ingress}}";

/// Outputs meaning the load balancer has no address yet
const PENDING_MARKERS: [&str; 2] = ["<no value>", "<none>"];

/// Field prefixes that carry an address in the Go map rendering
const ADDRESS_PREFIXES: [&str; 2] = ["[map[ip:", "[map[hostname:"];

/// State of a service's ingress as reported by one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressStatus {
    /// No address assigned yet
    Pending,
    /// Address (IP or hostname) assigned by the load balancer
    Assigned(String),
    /// Output in a shape we do not understand
    Unrecognized,
}

/// Parse the output of the template query
pub fn parse_template_output(output: &str) -> IngressStatus {
    let output = output.trim();
    if output.is_empty() || PENDING_MARKERS.iter().any(|m| output.contains(m)) {
        return IngressStatus::Pending;
    }

    for prefix in ADDRESS_PREFIXES {
        if let Some(rest) = output.strip_prefix(prefix) {
            if !output.ends_with("]]") {
                return IngressStatus::Unrecognized;
            }
            // Newer clusters add fields such as `ipMode:VIP` after the address,
            // and a service can list several ingress points; take the first.
            let address = rest
                .split(|c: char| c.is_whitespace() || c == ']')
                .next()
                .unwrap_or_default();
            return if address.is_empty() {
                IngressStatus::Unrecognized
            } else {
                IngressStatus::Assigned(address.to_string())
            };
        }
    }

    IngressStatus::Unrecognized
}

/// Parse the output of the JSON query (the full Service object)
pub fn parse_json_output(output: &str) -> IngressStatus {
    let service: Value = match serde_json::from_str(output) {
        Ok(value) => value,
        Err(_) => return IngressStatus::Unrecognized,
    };

    let Some(first) = service.pointer("/status/loadBalancer/ingress/0") else {
        return IngressStatus::Pending;
    };

    ["ip", "hostname"]
        .iter()
        .filter_map(|key| first.get(key).and_then(Value::as_str))
        .find(|address| !address.is_empty())
        .map(|address| IngressStatus::Assigned(address.to_string()))
        .unwrap_or(IngressStatus::Pending)
}
